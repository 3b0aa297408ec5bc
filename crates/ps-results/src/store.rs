//! Run storage API.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::export::{read_history_csv, write_history_csv};
use crate::types::{HistoryRow, RunManifest};
use crate::{ResultsError, ResultsResult};

const MANIFEST_FILE: &str = "manifest.json";
const HISTORY_FILE: &str = "history.csv";

/// Directory of runs, one subdirectory per run id.
#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST_FILE).exists()
    }

    /// Write `manifest.json` and `history.csv`, replacing a previous run
    /// with the same id.
    pub fn save_run(&self, manifest: &RunManifest, rows: &[HistoryRow]) -> ResultsResult<PathBuf> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST_FILE), manifest_json)?;

        let file = fs::File::create(run_dir.join(HISTORY_FILE))?;
        write_history_csv(file, &manifest.compartments, rows)?;

        info!(run_id = %manifest.run_id, rows = rows.len(), dir = %run_dir.display(), "saved run");
        Ok(run_dir)
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join(MANIFEST_FILE);

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_history(&self, run_id: &str) -> ResultsResult<Vec<HistoryRow>> {
        let history_path = self.run_dir(run_id).join(HISTORY_FILE);

        if !history_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let (_, rows) = read_history_csv(fs::File::open(history_path)?)?;
        Ok(rows)
    }

    /// Manifests of every stored run for `scenario`.
    pub fn list_runs(&self, scenario: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    if manifest.scenario == scenario {
                        runs.push(manifest);
                    }
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

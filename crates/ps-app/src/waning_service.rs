//! Stochastic waning model runs.

use std::fs::File;
use std::path::{Path, PathBuf};

use ps_core::RunContext;
use ps_waning::{RevaccinationStrategy, WaningModel, WaningParams, WaningTrajectory};
use tracing::info;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct WaningRequest {
    pub params_path: PathBuf,
    pub strategy: RevaccinationStrategy,
    pub seed: u64,
    /// Optional `day,S,I,R,V` CSV destination.
    pub output: Option<PathBuf>,
}

pub fn load_waning_params(path: &Path) -> AppResult<WaningParams> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_yaml::from_str(&content)
        .map_err(|e| AppError::InvalidInput(format!("Failed to parse waning parameters: {}", e)))
}

pub fn run_waning(request: &WaningRequest) -> AppResult<WaningTrajectory> {
    let params = load_waning_params(&request.params_path)?;
    let model = WaningModel::new(params)?
        .with_strategy(request.strategy)
        .with_seed(request.seed);
    let mut ctx = RunContext::new(format!("waning:{}", request.strategy)).with_progress_every(30);
    let trajectory = model.run(&mut ctx)?;

    if let Some(path) = &request.output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        trajectory.write_csv(File::create(path)?)?;
        info!(path = %path.display(), "wrote waning trajectory");
    }
    Ok(trajectory)
}

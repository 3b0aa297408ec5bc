//! ps-project: scenario file format, collaborator CSV inputs and validation.

pub mod csv_io;
pub mod inputs;
pub mod schema;
pub mod validate;

use std::path::{Path, PathBuf};

use tracing::info;

pub use csv_io::{read_edges, read_patches, read_seeds};
pub use inputs::ScenarioInputs;
pub use schema::*;
pub use validate::{ValidationError, validate_inputs, validate_scenario};

pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error in {}: {message}", path.display())]
    Csv { path: PathBuf, message: String },

    #[error("Unsupported scenario format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Make every file reference in `scenario` absolute relative to `base`.
pub fn resolve_paths(scenario: &mut Scenario, base: &Path) {
    fn fix<T>(source: &mut Source<T>, base: &Path) {
        if let Source::File { file } = source {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }
    fix(&mut scenario.patches, base);
    fix(&mut scenario.network.edges, base);
    fix(&mut scenario.seeds, base);
    if scenario.output.dir.is_relative() {
        scenario.output.dir = base.join(&scenario.output.dir);
    }
}

fn finish(mut scenario: Scenario, path: &Path) -> ProjectResult<Scenario> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_paths(&mut scenario, base);
    validate_scenario(&scenario)?;
    info!(name = %scenario.name, path = %path.display(), "loaded scenario");
    Ok(scenario)
}

pub fn load_yaml(path: &Path) -> ProjectResult<Scenario> {
    let content = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_yaml::from_str(&content)?;
    finish(scenario, path)
}

pub fn load_json(path: &Path) -> ProjectResult<Scenario> {
    let content = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&content)?;
    finish(scenario, path)
}

/// Load by extension: `.yaml`/`.yml` or `.json`.
pub fn load(path: &Path) -> ProjectResult<Scenario> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ProjectError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

pub fn save_yaml(path: &Path, scenario: &Scenario) -> ProjectResult<()> {
    validate_scenario(scenario)?;
    let content = serde_yaml::to_string(scenario)?;
    std::fs::write(path, content)?;
    Ok(())
}

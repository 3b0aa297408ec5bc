//! Content-based hashing for run IDs.

use ps_project::Scenario;
use ps_sim::SimulationMode;
use sha2::{Digest, Sha256};

pub fn compute_run_id(scenario: &Scenario, mode: SimulationMode, engine_version: &str) -> String {
    let mut hasher = Sha256::new();

    let scenario_json = serde_json::to_string(scenario).unwrap_or_default();
    hasher.update(scenario_json.as_bytes());

    hasher.update(mode.as_str().as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

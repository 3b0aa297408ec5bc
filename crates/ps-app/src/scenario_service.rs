//! Scenario loading, validation and introspection.

use std::path::Path;

use ps_project::{ModelDef, Scenario, ScenarioInputs};
use ps_sim::{ModelRegistry, SimulationMode};

use crate::error::AppResult;

/// Summary of a validated scenario for listing.
#[derive(Debug, Clone)]
pub struct ScenarioSummary {
    pub name: String,
    pub mode: SimulationMode,
    pub model: String,
    pub custom_model: bool,
    pub patches: usize,
    pub edges: usize,
    pub seeds: usize,
    pub interventions: usize,
    pub days: u32,
}

/// Load a scenario from YAML or JSON; relative paths resolve against its
/// directory.
pub fn load_scenario(path: &Path) -> AppResult<Scenario> {
    Ok(ps_project::load(path)?)
}

/// Load a scenario plus every file it references and cross-check them.
pub fn validate_scenario_file(path: &Path) -> AppResult<ScenarioSummary> {
    let scenario = load_scenario(path)?;
    let inputs = ScenarioInputs::load(&scenario)?;
    Ok(ScenarioSummary {
        name: scenario.name.clone(),
        mode: scenario.mode,
        model: scenario.model.name().to_string(),
        custom_model: matches!(scenario.model, ModelDef::Custom { .. }),
        patches: inputs.patches.len(),
        edges: inputs.edges.len(),
        seeds: inputs.seeds.len(),
        interventions: scenario.interventions.len(),
        days: scenario.time.days,
    })
}

/// Names of the models a scenario may reference with `kind: builtin`.
pub fn list_models(registry: &ModelRegistry) -> Vec<String> {
    registry.names().map(str::to_string).collect()
}

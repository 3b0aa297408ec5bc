//! Run execution and caching service.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ps_core::RunContext;
use ps_project::{Scenario, ScenarioInputs, Source};
use ps_results::{HistoryRow, RunManifest, RunStore, RunSummary, history_rows};
use ps_sim::ModelRegistry;
use tracing::info;

use crate::compile::compile_scenario;
use crate::error::AppResult;
use crate::query::{OutbreakSummary, recovered_compartment, summarize_outbreak};
use crate::scenario_service;

/// Folded into run ids so results from older engines are not reused.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    /// Emit a debug progress line every this many steps (0 disables).
    pub progress_every: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            progress_every: 10,
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub scenario_path: &'a Path,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub run_dir: PathBuf,
    pub loaded_from_cache: bool,
    pub outbreak: Option<OutbreakSummary>,
    pub elapsed_s: f64,
}

fn store_for(scenario: &Scenario) -> AppResult<RunStore> {
    Ok(RunStore::new(scenario.output.dir.join("runs"))?)
}

/// The scenario with file-backed inputs inlined, so the run id follows the
/// CSV contents rather than their paths.
fn hashed_form(scenario: &Scenario, inputs: &ScenarioInputs) -> Scenario {
    let mut hashed = scenario.clone();
    hashed.patches = Source::Inline(inputs.patches.clone());
    hashed.network.edges = Source::Inline(inputs.edges.clone());
    hashed.seeds = Source::Inline(inputs.seeds.clone());
    hashed.output = Default::default();
    hashed
}

/// Execute a scenario, or load its stored results when an identical run
/// already exists.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    let started = Instant::now();
    let scenario = scenario_service::load_scenario(request.scenario_path)?;
    let inputs = ScenarioInputs::load(&scenario)?;
    let run_id =
        ps_results::compute_run_id(&hashed_form(&scenario, &inputs), scenario.mode, ENGINE_VERSION);
    let store = store_for(&scenario)?;

    if request.options.use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        info!(run_id = %run_id, "loaded cached run");
        return Ok(RunResponse {
            run_dir: store.run_dir(&run_id),
            run_id,
            manifest,
            loaded_from_cache: true,
            outbreak: None,
            elapsed_s: started.elapsed().as_secs_f64(),
        });
    }

    let registry = ModelRegistry::with_builtins();
    let compiled = compile_scenario(scenario, &registry)?;
    let mut simulation = compiled.simulation()?;
    let mut ctx =
        RunContext::new(compiled.scenario.name.clone()).with_progress_every(request.options.progress_every);
    let trajectory = simulation.run(&mut ctx)?;

    let outbreak = match recovered_compartment(compiled.compartments()) {
        Some(recovered) => Some(summarize_outbreak(
            &trajectory,
            compiled.infected_compartment(),
            recovered,
        )?),
        None => None,
    };

    let mut manifest = RunManifest::new(
        run_id.clone(),
        compiled.scenario.name.clone(),
        compiled.scenario.mode,
        compiled.disease.name(),
    );
    manifest.regions = compiled.regions().to_vec();
    manifest.compartments = compiled.compartments().to_vec();
    manifest.days = compiled.scenario.time.days as usize;
    manifest.summary = RunSummary::from(ctx.stats());
    manifest.engine_version = ENGINE_VERSION.to_string();

    let rows = history_rows(&trajectory, &manifest.regions);
    let run_dir = store.save_run(&manifest, &rows)?;

    Ok(RunResponse {
        run_id,
        manifest,
        run_dir,
        loaded_from_cache: false,
        outbreak,
        elapsed_s: started.elapsed().as_secs_f64(),
    })
}

/// Stored runs of the scenario at `scenario_path`, oldest first.
pub fn list_runs(scenario_path: &Path) -> AppResult<Vec<RunManifest>> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    let store = store_for(&scenario)?;
    Ok(store.list_runs(&scenario.name)?)
}

/// Manifest and history rows of a stored run.
pub fn load_run(scenario_path: &Path, run_id: &str) -> AppResult<(RunManifest, Vec<HistoryRow>)> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    let store = store_for(&scenario)?;
    let manifest = store.load_manifest(run_id)?;
    let rows = store.load_history(run_id)?;
    Ok((manifest, rows))
}

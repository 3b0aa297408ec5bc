//! Shared application service layer for patchsim.
//!
//! Turns scenario files into runnable simulations, executes and caches runs,
//! fans parameter sweeps out over threads and drives the waning model. The
//! CLI is a thin shell over these functions.

pub mod compile;
pub mod error;
pub mod query;
pub mod run_service;
pub mod scenario_service;
pub mod sweep;
pub mod waning_service;

pub use compile::{
    CompiledScenario, build_disease_model, build_interventions, build_network, build_solver,
    compile_scenario,
};
pub use error::{AppError, AppResult};
pub use query::{OutbreakSummary, compartment_totals, recovered_compartment, summarize_outbreak};
pub use run_service::{
    ENGINE_VERSION, RunOptions, RunRequest, RunResponse, ensure_run, list_runs, load_run,
};
pub use scenario_service::{ScenarioSummary, list_models, load_scenario, validate_scenario_file};
pub use sweep::{SweepPoint, run_sweep};
pub use waning_service::{WaningRequest, load_waning_params, run_waning};

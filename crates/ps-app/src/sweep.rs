//! Parallel parameter sweeps.

use ps_core::RunContext;
use rayon::prelude::*;
use tracing::info;

use crate::compile::CompiledScenario;
use crate::error::{AppError, AppResult};
use crate::query::{OutbreakSummary, recovered_compartment, summarize_outbreak};

/// Outcome of the scenario at one parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub value: f64,
    pub summary: OutbreakSummary,
}

/// Run `compiled` once per value of `parameter`, in parallel.
///
/// Every run shares the compiled network and keeps its own state, history
/// and run context. Results come back in the order of `values`.
pub fn run_sweep(
    compiled: &CompiledScenario,
    parameter: &str,
    values: &[f64],
) -> AppResult<Vec<SweepPoint>> {
    let recovered = recovered_compartment(compiled.compartments())
        .ok_or_else(|| AppError::Model("model has no compartments".to_string()))?;
    let infected = compiled.infected_compartment();
    info!(parameter, points = values.len(), "starting sweep");

    values
        .par_iter()
        .map(|&value| {
            let mut simulation = compiled.simulation_with_parameter(parameter, value)?;
            let mut ctx = RunContext::new(format!("{}:{parameter}={value}", compiled.scenario.name));
            let trajectory = simulation.run(&mut ctx)?;
            let summary = summarize_outbreak(&trajectory, infected, recovered)?;
            Ok(SweepPoint { value, summary })
        })
        .collect()
}

//! Result data types.

use ps_core::RunStats;
use ps_sim::SimulationMode;
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub scenario: String,
    pub timestamp: String,
    pub mode: SimulationMode,
    pub model: String,
    pub regions: Vec<String>,
    pub compartments: Vec<String>,
    pub days: usize,
    pub summary: RunSummary,
    pub engine_version: String,
}

/// Counters copied from the run context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    pub rhs_evaluations: usize,
    pub clamped_values: usize,
    pub interventions_applied: usize,
}

impl From<&RunStats> for RunSummary {
    fn from(stats: &RunStats) -> Self {
        Self {
            steps: stats.steps,
            rhs_evaluations: stats.rhs_evaluations,
            clamped_values: stats.clamped_values,
            interventions_applied: stats.interventions_applied,
        }
    }
}

/// One region at one time point; `values` follow the manifest's compartments.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub region: String,
    pub day: f64,
    pub values: Vec<f64>,
}

impl RunManifest {
    /// Stamp a manifest with the current UTC time.
    pub fn new(
        run_id: RunId,
        scenario: impl Into<String>,
        mode: SimulationMode,
        model: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            scenario: scenario.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode,
            model: model.into(),
            regions: Vec::new(),
            compartments: Vec::new(),
            days: 0,
            summary: RunSummary::default(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

//! Scenario file schema.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use ps_core::{EdgeRecord, PatchRecord, SeedRecord};
use ps_model::Transition;
use ps_sim::SimulationMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub mode: SimulationMode,
    pub model: ModelDef,
    #[serde(default)]
    pub solver: SolverDef,
    pub time: TimeDef,
    pub patches: Source<PatchRecord>,
    #[serde(default)]
    pub network: NetworkDef,
    #[serde(default)]
    pub seeds: Source<SeedRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interventions: Vec<InterventionDef>,
    #[serde(default)]
    pub output: OutputDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDef {
    /// A model from the registry.
    Builtin {
        name: String,
        #[serde(default)]
        parameters: BTreeMap<String, f64>,
    },
    /// Compartments, parameters and transitions spelled out in the file.
    Custom {
        #[serde(default = "default_custom_name")]
        name: String,
        compartments: Vec<String>,
        #[serde(default)]
        parameters: BTreeMap<String, f64>,
        transitions: Vec<Transition>,
        #[serde(default = "default_infected")]
        infected: String,
    },
}

impl ModelDef {
    pub fn name(&self) -> &str {
        match self {
            ModelDef::Builtin { name, .. } | ModelDef::Custom { name, .. } => name,
        }
    }

    pub fn parameters(&self) -> &BTreeMap<String, f64> {
        match self {
            ModelDef::Builtin { parameters, .. } | ModelDef::Custom { parameters, .. } => {
                parameters
            }
        }
    }
}

fn default_custom_name() -> String {
    "custom".to_string()
}

fn default_infected() -> String {
    "I".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SolverDef {
    Rk4 {
        #[serde(default = "default_substeps")]
        substeps: usize,
    },
    Euler {
        #[serde(default = "default_substeps")]
        substeps: usize,
    },
    Dopri5 {
        #[serde(default = "default_rtol")]
        rtol: f64,
        #[serde(default = "default_atol")]
        atol: f64,
    },
}

impl Default for SolverDef {
    fn default() -> Self {
        SolverDef::Rk4 {
            substeps: default_substeps(),
        }
    }
}

fn default_substeps() -> usize {
    10
}

fn default_rtol() -> f64 {
    1e-6
}

fn default_atol() -> f64 {
    1e-9
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDef {
    pub start_date: NaiveDate,
    /// Simulated days; the grid has `days + 1` points.
    pub days: u32,
}

impl TimeDef {
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + chrono::Days::new(u64::from(self.days))
    }

    pub fn grid(&self) -> Vec<f64> {
        (0..=self.days).map(f64::from).collect()
    }
}

/// Records either listed inline or read from a CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source<T> {
    File { file: PathBuf },
    Inline(Vec<T>),
}

impl<T> Default for Source<T> {
    fn default() -> Self {
        Source::Inline(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDef {
    #[serde(default)]
    pub edges: Source<EdgeRecord>,
    /// Diagonal weight for patches without an explicit self-edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_coupling: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterventionDef {
    MoveFraction {
        from: String,
        to: String,
        fraction: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<f64>,
        /// Regions to act on; every region when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        regions: Option<Vec<String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDef {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputDef {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Execution semantics, fixed when a simulation is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    /// Difference equations, one step per grid point.
    #[default]
    Discrete,
    /// Continuous time through an ODE solver.
    Ode,
}

impl SimulationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SimulationMode::Discrete => "discrete",
            SimulationMode::Ode => "ode",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discrete" => Ok(SimulationMode::Discrete),
            "ode" => Ok(SimulationMode::Ode),
            other => Err(SimError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

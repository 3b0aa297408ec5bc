//! Model parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{WaningError, WaningResult};

/// How re-vaccinated individuals are chosen at the start of a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevaccinationStrategy {
    /// Uniformly at random from the vaccinated pool.
    #[default]
    Random,
    /// Those closest to losing immunity first.
    Targeted,
}

impl RevaccinationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            RevaccinationStrategy::Random => "random",
            RevaccinationStrategy::Targeted => "targeted",
        }
    }
}

impl fmt::Display for RevaccinationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevaccinationStrategy {
    type Err = WaningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(RevaccinationStrategy::Random),
            "targeted" | "targetted" => Ok(RevaccinationStrategy::Targeted),
            _ => Err(WaningError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}

/// Daily SIRSV parameters. Initial compartments are individual counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaningParams {
    pub beta: f64,
    pub gamma: f64,
    /// Fraction of S vaccinated per day during a round.
    pub vax_rate: f64,
    pub weibull_shape_vax: f64,
    pub weibull_scale_vax: f64,
    pub weibull_shape_rec: f64,
    pub weibull_scale_rec: f64,
    /// Length of the output series, day 0 included.
    pub days: usize,
    /// External infections per day.
    #[serde(default)]
    pub seed_rate: f64,
    /// Days between round starts.
    pub vax_period: usize,
    /// Vaccination days at the start of each round.
    pub vax_duration: usize,
    pub start_vax_day: usize,
    #[serde(rename = "S0")]
    pub s0: f64,
    #[serde(rename = "I0")]
    pub i0: f64,
    #[serde(rename = "R0", default)]
    pub r0: f64,
    #[serde(rename = "V0", default)]
    pub v0: f64,
}

impl WaningParams {
    pub fn population(&self) -> f64 {
        self.s0 + self.i0 + self.r0 + self.v0
    }

    pub fn validate(&self) -> WaningResult<()> {
        let non_negative = [
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("vax_rate", self.vax_rate),
            ("seed_rate", self.seed_rate),
            ("S0", self.s0),
            ("I0", self.i0),
            ("R0", self.r0),
            ("V0", self.v0),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(WaningError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite and non-negative",
                });
            }
        }

        let positive = [
            ("weibull_shape_vax", self.weibull_shape_vax),
            ("weibull_scale_vax", self.weibull_scale_vax),
            ("weibull_shape_rec", self.weibull_shape_rec),
            ("weibull_scale_rec", self.weibull_scale_rec),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(WaningError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite and positive",
                });
            }
        }

        if self.gamma > 1.0 {
            return Err(WaningError::InvalidParameter {
                name: "gamma",
                value: self.gamma,
                reason: "daily recovery fraction must not exceed 1",
            });
        }
        if self.days == 0 {
            return Err(WaningError::InvalidParameter {
                name: "days",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if self.vax_period == 0 {
            return Err(WaningError::InvalidParameter {
                name: "vax_period",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if self.population() <= 0.0 {
            return Err(WaningError::InvalidParameter {
                name: "population",
                value: self.population(),
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

//! State-mutating interventions applied between steps.

use ps_network::{FullState, NetworkError};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterventionError {
    #[error("Unknown compartment `{name}`")]
    UnknownCompartment { name: String },

    #[error("Patch {patch} out of range ({patches} patches)")]
    PatchOutOfRange { patch: usize, patches: usize },

    #[error("Fraction {value} outside [0, 1]")]
    InvalidFraction { value: f64 },

    #[error("Invalid count {value}")]
    InvalidCount { value: f64 },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Mutates the full state in place at time `t`.
///
/// Called after every discrete step, or at every grid point after the first
/// in ODE mode. Stateful interventions (one-shot seeding) keep their own
/// bookkeeping, hence `&mut self`.
pub trait Intervention {
    fn name(&self) -> &str;

    fn apply(&mut self, state: &mut FullState, t: f64) -> Result<(), InterventionError>;

    /// Clear per-run bookkeeping. Called at the start of every run.
    fn reset(&mut self) {}
}

fn compartment(state: &FullState, name: &str) -> Result<usize, InterventionError> {
    state
        .layout()
        .compartment_index(name)
        .ok_or_else(|| InterventionError::UnknownCompartment {
            name: name.to_string(),
        })
}

fn check_patch(state: &FullState, patch: usize) -> Result<(), InterventionError> {
    let patches = state.layout().num_patches();
    if patch >= patches {
        return Err(InterventionError::PatchOutOfRange { patch, patches });
    }
    Ok(())
}

/// Moves `fraction` of one compartment into another inside a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveFraction {
    pub from: String,
    pub to: String,
    pub fraction: f64,
    /// Inclusive window start
    pub start: f64,
    /// Inclusive window end
    pub end: f64,
    /// Patches to act on; `None` means every patch
    pub patches: Option<Vec<usize>>,
}

impl MoveFraction {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        fraction: f64,
    ) -> Result<Self, InterventionError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(InterventionError::InvalidFraction { value: fraction });
        }
        Ok(Self {
            from: from.into(),
            to: to.into(),
            fraction,
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
            patches: None,
        })
    }

    pub fn during(mut self, start: f64, end: f64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn for_patches(mut self, patches: Vec<usize>) -> Self {
        self.patches = Some(patches);
        self
    }

    fn is_active(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

impl Intervention for MoveFraction {
    fn name(&self) -> &str {
        "move_fraction"
    }

    fn apply(&mut self, state: &mut FullState, t: f64) -> Result<(), InterventionError> {
        if !self.is_active(t) {
            return Ok(());
        }
        let from = compartment(state, &self.from)?;
        let to = compartment(state, &self.to)?;
        let all: Vec<usize>;
        let patches = match &self.patches {
            Some(p) => p.as_slice(),
            None => {
                all = (0..state.layout().num_patches()).collect();
                all.as_slice()
            }
        };
        for &patch in patches {
            check_patch(state, patch)?;
            let moved = state.value(patch, from) * self.fraction;
            *state.value_mut(patch, from) -= moved;
            *state.value_mut(patch, to) += moved;
        }
        Ok(())
    }
}

/// One-shot importation: moves `count` from S to I in one patch once `t`
/// reaches `day`, capped by what S holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedInfections {
    pub patch: usize,
    pub day: f64,
    pub count: f64,
    pub from: String,
    pub to: String,
    fired: bool,
}

impl SeedInfections {
    pub fn new(patch: usize, day: f64, count: f64) -> Result<Self, InterventionError> {
        if !count.is_finite() || count < 0.0 {
            return Err(InterventionError::InvalidCount { value: count });
        }
        Ok(Self {
            patch,
            day,
            count,
            from: "S".to_string(),
            to: "I".to_string(),
            fired: false,
        })
    }

    pub fn with_compartments(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = from.into();
        self.to = to.into();
        self
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl Intervention for SeedInfections {
    fn name(&self) -> &str {
        "seed_infections"
    }

    fn apply(&mut self, state: &mut FullState, t: f64) -> Result<(), InterventionError> {
        if self.fired || t < self.day {
            return Ok(());
        }
        check_patch(state, self.patch)?;
        let from = compartment(state, &self.from)?;
        let to = compartment(state, &self.to)?;
        let moved = self.count.min(state.value(self.patch, from));
        *state.value_mut(self.patch, from) -= moved;
        *state.value_mut(self.patch, to) += moved;
        self.fired = true;
        debug!(patch = self.patch, t, moved, "seeded infections");
        Ok(())
    }

    fn reset(&mut self) {
        self.fired = false;
    }
}

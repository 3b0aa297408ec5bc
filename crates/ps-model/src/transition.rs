//! Transitions move population between compartments.

use ps_expr::RateExpression;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

/// A flow at `rate` from `from` into `to`.
///
/// A missing source is an inflow (births, importation); a missing target is
/// an outflow (deaths, emigration). Both endpoints missing is legal and has
/// no effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    pub rate: RateExpression,
}

impl Transition {
    pub fn new(from: Option<&str>, to: Option<&str>, rate: &str) -> ModelResult<Self> {
        Ok(Self {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            rate: RateExpression::parse(rate)?,
        })
    }

    pub fn flow(from: &str, to: &str, rate: &str) -> ModelResult<Self> {
        Self::new(Some(from), Some(to), rate)
    }

    pub fn inflow(to: &str, rate: &str) -> ModelResult<Self> {
        Self::new(None, Some(to), rate)
    }

    pub fn outflow(from: &str, rate: &str) -> ModelResult<Self> {
        Self::new(Some(from), None, rate)
    }

    /// `from -> to` with `∅` for open ends.
    pub fn label(&self) -> String {
        format!(
            "{} -> {}",
            self.from.as_deref().unwrap_or("∅"),
            self.to.as_deref().unwrap_or("∅")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_marks_open_ends() {
        let t = Transition::inflow("S", "mu*N").unwrap();
        assert_eq!(t.label(), "∅ -> S");
        let t = Transition::outflow("I", "delta*I").unwrap();
        assert_eq!(t.label(), "I -> ∅");
    }

    #[test]
    fn bad_rate_is_rejected_at_construction() {
        assert!(Transition::flow("S", "I", "beta *").is_err());
    }
}

//! Error types for ODE integration.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite state at t = {t}")]
    NonFinite { t: f64 },

    #[error("Step size underflow at t = {t} (h = {h:e})")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("Exceeded {max_steps} steps before reaching t = {t}")]
    MaxStepsExceeded { max_steps: usize, t: f64 },

    #[error("Right-hand side failed at t = {t}: {message}")]
    RhsFailed { t: f64, message: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

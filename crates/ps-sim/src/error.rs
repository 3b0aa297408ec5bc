//! Error types for simulation orchestration.

use ps_model::ModelError;
use ps_network::NetworkError;
use ps_solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Unknown simulation mode `{mode}` (expected `discrete` or `ode`)")]
    UnknownMode { mode: String },

    #[error("ODE mode requires a solver")]
    MissingSolver,

    #[error("Not implemented: {what}")]
    Unimplemented { what: &'static str },

    #[error("No initial state set")]
    MissingInitialState,

    #[error("Unknown model `{name}`")]
    UnknownModel { name: String },

    #[error("Model `{model}` requires parameter `{name}`")]
    MissingParameter { model: String, name: String },

    #[error("Intervention `{name}` failed at t = {t}: {message}")]
    Intervention { name: String, t: f64, message: String },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

pub type SimResult<T> = Result<T, SimError>;

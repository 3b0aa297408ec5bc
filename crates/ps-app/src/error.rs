//! Error types for the ps-app service layer.

use std::path::PathBuf;

/// Application error type that flattens errors from the backend crates into
/// one interface for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Scenario validation failed: {0}")]
    Validation(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Waning model error: {0}")]
    Waning(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ps-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ps_project::ProjectError> for AppError {
    fn from(err: ps_project::ProjectError) -> Self {
        match err {
            ps_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Scenario(other.to_string()),
        }
    }
}

impl From<ps_project::ValidationError> for AppError {
    fn from(err: ps_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ps_model::ModelError> for AppError {
    fn from(err: ps_model::ModelError) -> Self {
        AppError::Model(err.to_string())
    }
}

impl From<ps_solver::SolverError> for AppError {
    fn from(err: ps_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<ps_network::NetworkError> for AppError {
    fn from(err: ps_network::NetworkError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<ps_sim::SimError> for AppError {
    fn from(err: ps_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<ps_sim::InterventionError> for AppError {
    fn from(err: ps_sim::InterventionError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<ps_results::ResultsError> for AppError {
    fn from(err: ps_results::ResultsError) -> Self {
        match err {
            ps_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

impl From<ps_waning::WaningError> for AppError {
    fn from(err: ps_waning::WaningError) -> Self {
        AppError::Waning(err.to_string())
    }
}

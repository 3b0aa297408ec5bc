//! Error types for network construction and simulation.

use ps_model::ModelError;
use ps_solver::SolverError;
use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Force of infection undefined: patch {patch} has total population {total}")]
    DivisionByZeroForce { patch: usize, total: f64 },

    #[error("Network matrix is {rows}x{cols}, expected a square matrix")]
    NotSquare { rows: usize, cols: usize },

    #[error("Invalid network weight {weight} at ({row}, {col})")]
    InvalidWeight { row: usize, col: usize, weight: f64 },

    #[error("Network couples {network} patches, expected {expected}")]
    DimensionMismatch { expected: usize, network: usize },

    #[error("Compartment `{name}` is not declared by the base model")]
    MissingCompartment { name: String },

    #[error("State is missing key `{key}`")]
    MissingKey { key: String },

    #[error("Unknown state key `{key}`")]
    UnknownKey { key: String },

    #[error("State has {got} values, layout expects {expected}")]
    StateLength { expected: usize, got: usize },

    #[error("Unknown region `{region}`")]
    UnknownRegion { region: String },

    #[error("Region `{region}` declared more than once")]
    DuplicateRegion { region: String },

    #[error("Time grid must contain at least one point")]
    EmptyTimeGrid,

    #[error("Non-finite value for `{key}` at t = {t}")]
    NonFinite { key: String, t: f64 },

    #[error("Solver returned a {rows}x{cols} matrix, expected {expected_rows}x{expected_cols}")]
    SolverShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

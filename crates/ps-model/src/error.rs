//! Error types for model definition and rate evaluation.

use ps_expr::ExprError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Undefined variable `{name}` in rate of transition {transition} (`{rate}`)")]
    UndefinedVariable {
        name: String,
        transition: usize,
        rate: String,
    },

    #[error("Failed to evaluate rate of transition {transition} (`{rate}`): {error}")]
    Expression {
        transition: usize,
        rate: String,
        error: ExprError,
    },

    #[error("Invalid rate expression: {0}")]
    Parse(#[from] ExprError),

    #[error("Transition {transition} references unknown compartment `{name}`")]
    UnknownCompartment { name: String, transition: usize },

    #[error("Compartment `{name}` declared more than once")]
    DuplicateCompartment { name: String },

    #[error("Model must declare at least one compartment")]
    EmptyModel,

    #[error("State vector has {got} values, model has {expected} compartments")]
    StateLength { expected: usize, got: usize },
}

impl ModelError {
    /// Attach transition context to an evaluation failure.
    pub(crate) fn from_evaluation(error: ExprError, transition: usize, rate: &str) -> Self {
        match error {
            ExprError::UndefinedVariable { name } => ModelError::UndefinedVariable {
                name,
                transition,
                rate: rate.to_string(),
            },
            error => ModelError::Expression {
                transition,
                rate: rate.to_string(),
                error,
            },
        }
    }
}

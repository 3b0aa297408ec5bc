//! Expression errors.

use thiserror::Error;

pub type ExprResult<T> = Result<T, ExprError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Failed to parse expression `{source_text}`: {message}")]
    Parse {
        source_text: String,
        message: String,
    },

    #[error("Unsupported construct in rate expression: {what}")]
    Unsupported { what: String },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Function {name} expects {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero in `{op}`")]
    DivisionByZero { op: &'static str },
}

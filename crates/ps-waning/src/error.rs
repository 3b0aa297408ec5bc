use thiserror::Error;

pub type WaningResult<T> = Result<T, WaningError>;

#[derive(Error, Debug)]
pub enum WaningError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Unknown re-vaccination strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("Waning distribution: {message}")]
    Distribution { message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

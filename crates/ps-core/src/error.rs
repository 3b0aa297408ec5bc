use thiserror::Error;

/// Failures of the numeric guards in [`crate::numeric`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Negative value for {what}: {value}")]
    Negative { what: &'static str, value: f64 },
}

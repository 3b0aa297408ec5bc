//! ps-core: stable foundation for patchsim.
//!
//! Contains:
//! - error (shared error types)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact patch identifiers)
//! - records (collaborator input records: patches, edges, seeds)
//! - context (explicit per-run diagnostics)

pub mod context;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod records;

// Re-exports: nice ergonomics for downstream crates
pub use context::{RunContext, RunStats};
pub use error::PsError;
pub use ids::*;
pub use numeric::*;
pub use records::{EdgeRecord, PatchRecord, SeedRecord};

//! Readers for the patch, edge and seed CSV files.

use std::path::Path;

use ps_core::{EdgeRecord, PatchRecord, SeedRecord};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{ProjectError, ProjectResult};

fn read_records<T: DeserializeOwned>(path: &Path, what: &str) -> ProjectResult<Vec<T>> {
    let csv_error = |e: csv::Error| ProjectError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_error)?;
    info!(path = %path.display(), rows = records.len(), "read {what} file");
    Ok(records)
}

/// Columns `region, population`.
pub fn read_patches(path: &Path) -> ProjectResult<Vec<PatchRecord>> {
    read_records(path, "patch")
}

/// Columns `source, target, weight`.
pub fn read_edges(path: &Path) -> ProjectResult<Vec<EdgeRecord>> {
    read_records(path, "network")
}

/// Columns `region, date, seed_count` (or `count`); dates as `YYYY-MM-DD`.
pub fn read_seeds(path: &Path) -> ProjectResult<Vec<SeedRecord>> {
    read_records(path, "seed")
}

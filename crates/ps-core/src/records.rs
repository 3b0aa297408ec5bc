//! Collaborator input records.
//!
//! These are the plain rows read from patch population, network edge and
//! seeding files. All three are keyed by the same stable region identifier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Total population of one patch at simulation start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub region: String,
    pub population: f64,
}

/// One directed coupling: infection pressure flows from `source` into `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Infections introduced into a region on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub region: String,
    pub date: NaiveDate,
    #[serde(alias = "seed_count")]
    pub count: f64,
}

impl SeedRecord {
    /// Whole days between `start` and this seed's date (negative if before).
    pub fn day_offset(&self, start: NaiveDate) -> i64 {
        (self.date - start).num_days()
    }
}

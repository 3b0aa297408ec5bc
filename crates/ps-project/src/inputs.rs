//! Patch, edge and seed records resolved from a scenario.

use chrono::NaiveDate;
use ps_core::{EdgeRecord, PatchRecord, SeedRecord};

use crate::csv_io::{read_edges, read_patches, read_seeds};
use crate::schema::{Scenario, Source};
use crate::validate::validate_inputs;
use crate::ProjectResult;

/// Everything a scenario references, loaded and cross-checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioInputs {
    pub patches: Vec<PatchRecord>,
    pub edges: Vec<EdgeRecord>,
    pub seeds: Vec<SeedRecord>,
}

fn resolve<T: Clone>(
    source: &Source<T>,
    read: fn(&std::path::Path) -> ProjectResult<Vec<T>>,
) -> ProjectResult<Vec<T>> {
    match source {
        Source::File { file } => read(file),
        Source::Inline(records) => Ok(records.clone()),
    }
}

impl ScenarioInputs {
    /// Read file sources (paths already resolved by the loader) and validate.
    pub fn load(scenario: &Scenario) -> ProjectResult<Self> {
        let inputs = Self {
            patches: resolve(&scenario.patches, read_patches)?,
            edges: resolve(&scenario.network.edges, read_edges)?,
            seeds: resolve(&scenario.seeds, read_seeds)?,
        };
        validate_inputs(scenario, &inputs.patches, &inputs.edges, &inputs.seeds)?;
        Ok(inputs)
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.patches.iter().map(|p| p.region.as_str())
    }

    /// Seeds dated on or before `start`, summed per region in patch order.
    pub fn initial_seeds(&self, start: NaiveDate) -> Vec<SeedRecord> {
        self.patches
            .iter()
            .filter_map(|patch| {
                let mut matching = self
                    .seeds
                    .iter()
                    .filter(|s| s.region == patch.region && s.date <= start)
                    .peekable();
                matching.peek()?;
                let count = matching.map(|s| s.count).sum::<f64>();
                Some(SeedRecord {
                    region: patch.region.clone(),
                    date: start,
                    count: count.min(patch.population),
                })
            })
            .collect()
    }

    /// Seeds dated after `start`, as `(patch index, day offset, count)`.
    pub fn later_seeds(&self, start: NaiveDate) -> Vec<(usize, i64, f64)> {
        self.seeds
            .iter()
            .filter(|s| s.date > start)
            .filter_map(|s| {
                let patch = self.patches.iter().position(|p| p.region == s.region)?;
                Some((patch, s.day_offset(start), s.count))
            })
            .collect()
    }
}

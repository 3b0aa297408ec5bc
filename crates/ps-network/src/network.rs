//! Static coupling network between patches.

use std::collections::HashMap;

use nalgebra::DMatrix;
use ps_core::{EdgeRecord, PatchId, ensure_non_negative};
use tracing::debug;

use crate::error::{NetworkError, NetworkResult};

/// N×N weight matrix; `weight(i, j)` is the coupling patch `i` receives from
/// patch `j`.
///
/// Weights are finite and non-negative. Each patch carries a region name,
/// which defaults to its index.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    weights: DMatrix<f64>,
    regions: Vec<String>,
}

impl Network {
    /// Validate a weight matrix.
    pub fn new(weights: DMatrix<f64>) -> NetworkResult<Self> {
        let regions = (0..weights.nrows()).map(|i| i.to_string()).collect();
        Self::with_regions(weights, regions)
    }

    /// Validate a weight matrix and name its patches.
    pub fn with_regions(weights: DMatrix<f64>, regions: Vec<String>) -> NetworkResult<Self> {
        let (rows, cols) = weights.shape();
        if rows != cols {
            return Err(NetworkError::NotSquare { rows, cols });
        }
        if regions.len() != rows {
            return Err(NetworkError::DimensionMismatch {
                expected: regions.len(),
                network: rows,
            });
        }
        for row in 0..rows {
            for col in 0..cols {
                let weight = weights[(row, col)];
                ensure_non_negative(weight, "network weight")
                    .map_err(|_| NetworkError::InvalidWeight { row, col, weight })?;
            }
        }
        for (i, region) in regions.iter().enumerate() {
            if regions[..i].contains(region) {
                return Err(NetworkError::DuplicateRegion {
                    region: region.clone(),
                });
            }
        }
        Ok(Self { weights, regions })
    }

    /// Build from row vectors; ragged input is rejected.
    pub fn from_rows(rows: &[Vec<f64>]) -> NetworkResult<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(NetworkError::NotSquare {
                rows: n,
                cols: bad.len(),
            });
        }
        let weights = DMatrix::from_fn(n, n, |i, j| rows[i][j]);
        Self::new(weights)
    }

    /// Every patch coupled only to itself with weight 1.
    pub fn identity(n: usize) -> Self {
        Self {
            weights: DMatrix::identity(n, n),
            regions: (0..n).map(|i| i.to_string()).collect(),
        }
    }

    /// No coupling at all.
    pub fn zeros(n: usize) -> Self {
        Self {
            weights: DMatrix::zeros(n, n),
            regions: (0..n).map(|i| i.to_string()).collect(),
        }
    }

    pub fn num_patches(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[(i, j)]
    }

    pub fn weights(&self) -> &DMatrix<f64> {
        &self.weights
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn region(&self, patch: usize) -> Option<&str> {
        self.regions.get(patch).map(String::as_str)
    }

    pub fn region_index(&self, region: &str) -> Option<usize> {
        self.regions.iter().position(|r| r == region)
    }

    pub fn is_symmetric(&self) -> bool {
        self.weights == self.weights.transpose()
    }
}

/// Incremental builder keyed by region names.
///
/// Use `add_patch` for every region, then `add_edge` for every coupling, then
/// `build()` to validate and freeze the matrix. Repeated edges between the
/// same pair accumulate.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    regions: Vec<String>,
    index: HashMap<String, PatchId>,
    edges: Vec<(PatchId, PatchId, f64)>,
    self_coupling: Option<f64>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region and return its patch id.
    pub fn add_patch(&mut self, region: impl Into<String>) -> NetworkResult<PatchId> {
        let region = region.into();
        if self.index.contains_key(&region) {
            return Err(NetworkError::DuplicateRegion { region });
        }
        let id = PatchId::from_index(self.regions.len());
        self.index.insert(region.clone(), id);
        self.regions.push(region);
        Ok(id)
    }

    pub fn patch_id(&self, region: &str) -> Option<PatchId> {
        self.index.get(region).copied()
    }

    pub fn num_patches(&self) -> usize {
        self.regions.len()
    }

    /// Infection pressure flows from `source` into `target`.
    pub fn add_edge(&mut self, source: &str, target: &str, weight: f64) -> NetworkResult<()> {
        let lookup = |region: &str| {
            self.patch_id(region)
                .ok_or_else(|| NetworkError::UnknownRegion {
                    region: region.to_string(),
                })
        };
        let source = lookup(source)?;
        let target = lookup(target)?;
        ensure_non_negative(weight, "network weight").map_err(|_| NetworkError::InvalidWeight {
            row: target.index(),
            col: source.index(),
            weight,
        })?;
        self.edges.push((source, target, weight));
        Ok(())
    }

    pub fn add_edge_record(&mut self, edge: &EdgeRecord) -> NetworkResult<()> {
        self.add_edge(&edge.source, &edge.target, edge.weight)
    }

    /// Diagonal weight for every patch without an explicit self-edge.
    pub fn with_self_coupling(mut self, weight: f64) -> Self {
        self.self_coupling = Some(weight);
        self
    }

    pub fn build(self) -> NetworkResult<Network> {
        let n = self.regions.len();
        let mut weights = DMatrix::zeros(n, n);
        let mut has_self_edge = vec![false; n];
        for (source, target, weight) in &self.edges {
            weights[(target.index(), source.index())] += *weight;
            if source == target {
                has_self_edge[source.index()] = true;
            }
        }
        if let Some(w) = self.self_coupling {
            for (i, explicit) in has_self_edge.iter().enumerate() {
                if !explicit {
                    weights[(i, i)] = w;
                }
            }
        }
        debug!(patches = n, edges = self.edges.len(), "built network");
        Network::with_regions(weights, self.regions)
    }
}

//! Recorded series over the time grid.

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::error::{NetworkError, NetworkResult};
use crate::state::{FullState, StateLayout};

/// One series per qualified key, one entry per recorded time point.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    layout: Arc<StateLayout>,
    columns: Vec<Vec<f64>>,
    len: usize,
}

impl History {
    pub fn new(layout: Arc<StateLayout>) -> Self {
        let columns = vec![Vec::new(); layout.len()];
        Self {
            layout,
            columns,
            len: 0,
        }
    }

    /// Reshape a solver matrix (rows = time points, columns = flat state).
    pub fn from_matrix(
        layout: Arc<StateLayout>,
        matrix: &DMatrix<f64>,
        expected_rows: usize,
    ) -> NetworkResult<Self> {
        let (rows, cols) = matrix.shape();
        if rows != expected_rows || cols != layout.len() {
            return Err(NetworkError::SolverShape {
                rows,
                cols,
                expected_rows,
                expected_cols: layout.len(),
            });
        }
        let columns = (0..cols)
            .map(|j| matrix.column(j).iter().copied().collect())
            .collect();
        Ok(Self {
            layout,
            columns,
            len: rows,
        })
    }

    /// Append one time point.
    pub fn push(&mut self, state: &FullState) {
        self.push_values(state.values());
    }

    pub fn push_values(&mut self, values: &[f64]) {
        for (column, v) in self.columns.iter_mut().zip(values) {
            column.push(*v);
        }
        self.len += 1;
    }

    pub fn layout(&self) -> &Arc<StateLayout> {
        &self.layout
    }

    /// Number of recorded time points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn keys(&self) -> &[String] {
        self.layout.keys()
    }

    pub fn series(&self, key: &str) -> Option<&[f64]> {
        self.layout
            .index_of(key)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Flat state at time index `k`.
    pub fn row(&self, k: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[k]).collect()
    }

    pub fn state_at(&self, k: usize) -> NetworkResult<FullState> {
        FullState::from_values(self.layout.clone(), self.row(k))
    }

    /// Sum of one compartment over all patches at every time point.
    pub fn compartment_total(&self, compartment: &str) -> Option<Vec<f64>> {
        let c = self.layout.compartment_index(compartment)?;
        let totals = (0..self.len)
            .map(|k| {
                (0..self.layout.num_patches())
                    .map(|p| self.columns[self.layout.position(p, c)][k])
                    .sum()
            })
            .collect();
        Some(totals)
    }
}

/// Output of every run: the time grid and the recorded history.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub history: History,
}

impl Trajectory {
    pub fn final_state(&self) -> Option<FullState> {
        if self.history.is_empty() {
            return None;
        }
        self.history.state_at(self.history.len() - 1).ok()
    }

    pub fn series(&self, key: &str) -> Option<&[f64]> {
        self.history.series(key)
    }
}

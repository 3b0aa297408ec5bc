//! Flat multi-patch state addressed by qualified keys.

use std::collections::HashMap;
use std::sync::Arc;

use ps_model::NamedValues;

use crate::error::{NetworkError, NetworkResult};

/// Maps `"{compartment}_{patch}"` keys to positions in a flat vector.
///
/// Positions run patch-major, then compartment declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct StateLayout {
    compartments: Vec<String>,
    num_patches: usize,
    keys: Vec<String>,
    index: HashMap<String, usize>,
}

impl StateLayout {
    pub fn new(compartments: &[String], num_patches: usize) -> Self {
        let keys: Vec<String> = (0..num_patches)
            .flat_map(|p| compartments.iter().map(move |c| Self::key(c, p)))
            .collect();
        let index = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        Self {
            compartments: compartments.to_vec(),
            num_patches,
            keys,
            index,
        }
    }

    /// Qualified key for one compartment of one patch.
    pub fn key(compartment: &str, patch: usize) -> String {
        format!("{compartment}_{patch}")
    }

    pub fn compartments(&self) -> &[String] {
        &self.compartments
    }

    pub fn num_compartments(&self) -> usize {
        self.compartments.len()
    }

    pub fn num_patches(&self) -> usize {
        self.num_patches
    }

    /// All keys in flat order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn position(&self, patch: usize, compartment: usize) -> usize {
        patch * self.compartments.len() + compartment
    }

    pub fn compartment_index(&self, name: &str) -> Option<usize> {
        self.compartments.iter().position(|c| c == name)
    }

    /// Flat range holding one patch's compartments.
    pub fn patch_range(&self, patch: usize) -> std::ops::Range<usize> {
        let nc = self.compartments.len();
        patch * nc..(patch + 1) * nc
    }
}

/// Values for every compartment of every patch.
#[derive(Debug, Clone, PartialEq)]
pub struct FullState {
    layout: Arc<StateLayout>,
    values: Vec<f64>,
}

impl FullState {
    pub fn zeros(layout: Arc<StateLayout>) -> Self {
        let values = vec![0.0; layout.len()];
        Self { layout, values }
    }

    /// Wrap a flat vector in layout order.
    pub fn from_values(layout: Arc<StateLayout>, values: Vec<f64>) -> NetworkResult<Self> {
        if values.len() != layout.len() {
            return Err(NetworkError::StateLength {
                expected: layout.len(),
                got: values.len(),
            });
        }
        Ok(Self { layout, values })
    }

    /// Build from qualified `(key, value)` pairs; every layout key is required.
    pub fn from_pairs<K: AsRef<str>>(
        layout: Arc<StateLayout>,
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> NetworkResult<Self> {
        let mut values = vec![None; layout.len()];
        for (key, value) in pairs {
            let key = key.as_ref();
            let idx = layout
                .index_of(key)
                .ok_or_else(|| NetworkError::UnknownKey {
                    key: key.to_string(),
                })?;
            values[idx] = Some(value);
        }
        let values = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| NetworkError::MissingKey {
                    key: layout.keys()[i].clone(),
                })
            })
            .collect::<NetworkResult<Vec<_>>>()?;
        Ok(Self { layout, values })
    }

    /// Build from one named state per patch.
    pub fn from_patches(layout: Arc<StateLayout>, patches: &[NamedValues]) -> NetworkResult<Self> {
        if patches.len() != layout.num_patches() {
            return Err(NetworkError::DimensionMismatch {
                expected: layout.num_patches(),
                network: patches.len(),
            });
        }
        let mut values = Vec::with_capacity(layout.len());
        for (p, patch) in patches.iter().enumerate() {
            for c in layout.compartments() {
                let v = patch.get(c).ok_or_else(|| NetworkError::MissingKey {
                    key: StateLayout::key(c, p),
                })?;
                values.push(v);
            }
            if let Some(extra) = patch.names().find(|n| layout.compartment_index(n).is_none()) {
                return Err(NetworkError::UnknownKey {
                    key: StateLayout::key(extra, p),
                });
            }
        }
        Ok(Self { layout, values })
    }

    pub fn layout(&self) -> &Arc<StateLayout> {
        &self.layout
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.layout.index_of(key).map(|i| self.values[i])
    }

    pub fn set(&mut self, key: &str, value: f64) -> NetworkResult<()> {
        let idx = self
            .layout
            .index_of(key)
            .ok_or_else(|| NetworkError::UnknownKey {
                key: key.to_string(),
            })?;
        self.values[idx] = value;
        Ok(())
    }

    pub fn value(&self, patch: usize, compartment: usize) -> f64 {
        self.values[self.layout.position(patch, compartment)]
    }

    pub fn value_mut(&mut self, patch: usize, compartment: usize) -> &mut f64 {
        let idx = self.layout.position(patch, compartment);
        &mut self.values[idx]
    }

    pub fn patch_slice(&self, patch: usize) -> &[f64] {
        &self.values[self.layout.patch_range(patch)]
    }

    pub fn patch_slice_mut(&mut self, patch: usize) -> &mut [f64] {
        let range = self.layout.patch_range(patch);
        &mut self.values[range]
    }

    /// Sum of one patch's compartments.
    pub fn patch_total(&self, patch: usize) -> f64 {
        self.patch_slice(patch).iter().sum()
    }

    /// One patch as a named state.
    pub fn patch_state(&self, patch: usize) -> NamedValues {
        NamedValues::zip(self.layout.compartments(), self.patch_slice(patch))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.layout
            .keys()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

//! Name environments for expression evaluation.

use std::collections::{BTreeMap, HashMap};

/// Anything that can resolve a name to a number.
pub trait VariableSource {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl VariableSource for HashMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl VariableSource for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

/// Parallel name/value slices, e.g. one patch's compartments.
#[derive(Debug, Clone, Copy)]
pub struct NamedSlice<'a> {
    names: &'a [String],
    values: &'a [f64],
}

impl<'a> NamedSlice<'a> {
    /// Pairs `names[i]` with `values[i]`; extra entries on either side are ignored.
    pub fn new(names: &'a [String], values: &'a [f64]) -> Self {
        Self { names, values }
    }
}

impl VariableSource for NamedSlice<'_> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .zip(self.values)
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| *v)
    }
}

/// Layered scope: later layers shadow earlier ones.
#[derive(Default)]
pub struct Scope<'a> {
    layers: Vec<&'a dyn VariableSource>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Push a layer that takes precedence over every layer added before it.
    pub fn with_layer(mut self, layer: &'a dyn VariableSource) -> Self {
        self.layers.push(layer);
        self
    }
}

impl VariableSource for Scope<'_> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.layers.iter().rev().find_map(|layer| layer.lookup(name))
    }
}

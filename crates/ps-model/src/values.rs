//! Insertion-ordered name → value maps.

use ps_expr::VariableSource;

/// Small ordered mapping used for patch states, deltas and extras.
///
/// Lookups are linear; these maps hold one patch's compartments or a handful
/// of extra values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedValues {
    entries: Vec<(String, f64)>,
}

impl NamedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        let mut values = Self::new();
        for (name, value) in pairs {
            values.insert(name, value);
        }
        values
    }

    /// Build from parallel name/value slices.
    pub fn zip(names: &[String], values: &[f64]) -> Self {
        Self {
            entries: names.iter().cloned().zip(values.iter().copied()).collect(),
        }
    }

    /// Set `name`, keeping its position if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    /// Copy `other` over `self`; entries of `other` win on collision.
    pub fn merge(&mut self, other: &NamedValues) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }
}

impl VariableSource for NamedValues {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for NamedValues {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

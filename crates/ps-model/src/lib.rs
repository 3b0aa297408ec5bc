//! ps-model: declarative compartmental disease models.
//!
//! A [`CompartmentalModel`] is an immutable definition made of ordered
//! compartment names, named parameters and [`Transition`]s whose rates are
//! sandboxed arithmetic expressions. For one patch at one instant it turns a
//! compartment state into per-compartment deltas.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use ps_model::{CompartmentalModel, NamedValues, Transition};
//!
//! let model = CompartmentalModel::new(
//!     vec!["S".into(), "I".into(), "R".into()],
//!     BTreeMap::from([("beta".into(), 0.3), ("gamma".into(), 0.1)]),
//!     vec![
//!         Transition::flow("S", "I", "beta*S*lambda_i").unwrap(),
//!         Transition::flow("I", "R", "gamma*I").unwrap(),
//!     ],
//! )
//! .unwrap();
//!
//! let state = NamedValues::from_pairs([("S", 99.0), ("I", 1.0), ("R", 0.0)]);
//! let extras = NamedValues::from_pairs([("lambda_i", 0.01)]);
//! let deltas = model.compute_transition_rates(&state, Some(&extras)).unwrap();
//! assert!((deltas.get("I").unwrap() - 0.197).abs() < 1e-12);
//! ```

pub mod error;
pub mod model;
pub mod transition;
pub mod values;

pub use error::{ModelError, ModelResult};
pub use model::CompartmentalModel;
pub use transition::Transition;
pub use values::NamedValues;

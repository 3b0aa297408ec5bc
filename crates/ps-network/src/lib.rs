//! ps-network: patches coupled through a static weighted network.
//!
//! - [`Network`] / [`NetworkBuilder`]: validated N×N weight matrix, built
//!   directly or from region-keyed edge records
//! - [`StateLayout`] / [`FullState`]: flat patch-major state addressed by
//!   `"{compartment}_{patch}"` keys
//! - [`History`] / [`Trajectory`]: per-key series over the time grid
//! - [`NetworkModel`]: force of infection plus discrete and ODE simulation

pub mod error;
pub mod history;
pub mod model;
pub mod network;
pub mod state;

pub use error::{NetworkError, NetworkResult};
pub use history::{History, Trajectory};
pub use model::{FORCE_OF_INFECTION, NetworkModel, PatchExtrasFn};
pub use network::{Network, NetworkBuilder};
pub use state::{FullState, StateLayout};

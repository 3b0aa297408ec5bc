//! Simulation orchestration for patch networks.
//!
//! Provides:
//! - [`Simulation`]: mode dispatch between discrete stepping and ODE integration
//! - [`Intervention`] capability with [`MoveFraction`] and [`SeedInfections`]
//! - [`ModelRegistry`] of named [`DiseaseModel`]s (`sir`, `seir`, `sirs`)

pub mod error;
pub mod intervention;
pub mod mode;
pub mod registry;
pub mod simulation;

pub use error::{SimError, SimResult};
pub use intervention::{Intervention, InterventionError, MoveFraction, SeedInfections};
pub use mode::SimulationMode;
pub use registry::{CustomModel, DiseaseModel, ModelFactory, ModelRegistry, seeded_patch};
pub use simulation::Simulation;

//! ps-waning: single-population SIRSV model with individually tracked
//! immunity.
//!
//! Vaccinated and recovered individuals each carry a remaining-immunity
//! countdown drawn from a Weibull distribution. When a countdown runs out the
//! individual returns to S. Vaccination happens in periodic rounds; at the
//! start of each round part of the vaccinated pool is re-vaccinated, which
//! redraws their countdowns.

pub mod error;
pub mod model;
pub mod params;

pub use error::{WaningError, WaningResult};
pub use model::{WaningDiagnostics, WaningModel, WaningTrajectory};
pub use params::{RevaccinationStrategy, WaningParams};

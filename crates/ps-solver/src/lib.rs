//! ps-solver: ODE integration over a fixed output time grid.
//!
//! Solvers implement [`OdeSolver`]: given a right-hand side, an initial vector
//! and a strictly increasing time grid they return a matrix with one row per
//! grid point. Any function with the matching signature is a solver too.

pub mod adaptive;
pub mod error;
pub mod fixed;
pub mod solver;

pub use adaptive::DormandPrince;
pub use error::{SolverError, SolverResult};
pub use fixed::{FixedStepSolver, IntegratorType};
pub use solver::{OdeSolver, Rhs, validate_inputs};

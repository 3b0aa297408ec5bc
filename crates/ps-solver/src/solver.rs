//! The solver seam.

use nalgebra::DMatrix;

use crate::error::{SolverError, SolverResult};

/// Right-hand side `rhs(y, t, dydt)`; `dydt` has the length of `y`.
pub type Rhs<'a> = dyn FnMut(&[f64], f64, &mut [f64]) -> SolverResult<()> + 'a;

/// Integrates `rhs` from `y0` at `t[0]` and reports the state at every `t[k]`.
///
/// The result has `t.len()` rows and `y0.len()` columns; row 0 is `y0`.
pub trait OdeSolver {
    fn solve(&self, rhs: &mut Rhs<'_>, y0: &[f64], t: &[f64]) -> SolverResult<DMatrix<f64>>;
}

impl<F> OdeSolver for F
where
    F: Fn(&mut Rhs<'_>, &[f64], &[f64]) -> SolverResult<DMatrix<f64>>,
{
    fn solve(&self, rhs: &mut Rhs<'_>, y0: &[f64], t: &[f64]) -> SolverResult<DMatrix<f64>> {
        self(rhs, y0, t)
    }
}

/// Common checks shared by the built-in solvers.
pub fn validate_inputs(y0: &[f64], t: &[f64]) -> SolverResult<()> {
    if t.is_empty() {
        return Err(SolverError::InvalidArg {
            what: "time grid must not be empty",
        });
    }
    if t.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::InvalidArg {
            what: "time grid must be finite",
        });
    }
    if t.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SolverError::InvalidArg {
            what: "time grid must be strictly increasing",
        });
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::NonFinite { t: t[0] });
    }
    Ok(())
}

/// Allocate the output matrix with `y0` in row 0.
pub(crate) fn output_matrix(y0: &[f64], rows: usize) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(rows, y0.len());
    store_row(&mut out, 0, y0);
    out
}

pub(crate) fn store_row(out: &mut DMatrix<f64>, row: usize, y: &[f64]) {
    for (j, v) in y.iter().enumerate() {
        out[(row, j)] = *v;
    }
}

pub(crate) fn check_finite(y: &[f64], t: f64) -> SolverResult<()> {
    if y.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SolverError::NonFinite { t })
    }
}

//! Fixed-step integrators.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::solver::{OdeSolver, Rhs, check_finite, output_matrix, store_row, validate_inputs};

/// Integrator selection for [`FixedStepSolver`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (default, 4 rhs calls per step).
    #[default]
    #[serde(alias = "RK4")]
    Rk4,
    /// Forward Euler (1st-order, 1 rhs call per step).
    #[serde(alias = "euler")]
    ForwardEuler,
}

/// Stage buffers reused across steps.
struct Workspace {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    ytmp: Vec<f64>,
}

impl Workspace {
    fn new(n: usize) -> Self {
        Self {
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
            ytmp: vec![0.0; n],
        }
    }
}

/// Takes `substeps` equal steps inside every grid interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedStepSolver {
    pub method: IntegratorType,
    pub substeps: usize,
}

impl Default for FixedStepSolver {
    fn default() -> Self {
        Self {
            method: IntegratorType::Rk4,
            substeps: 10,
        }
    }
}

impl FixedStepSolver {
    pub fn new(method: IntegratorType, substeps: usize) -> Self {
        Self { method, substeps }
    }

    pub fn rk4(substeps: usize) -> Self {
        Self::new(IntegratorType::Rk4, substeps)
    }

    pub fn forward_euler(substeps: usize) -> Self {
        Self::new(IntegratorType::ForwardEuler, substeps)
    }

    fn step(
        &self,
        rhs: &mut Rhs<'_>,
        t: f64,
        y: &mut [f64],
        dt: f64,
        ws: &mut Workspace,
    ) -> SolverResult<()> {
        match self.method {
            IntegratorType::Rk4 => rk4_step(rhs, t, y, dt, ws),
            IntegratorType::ForwardEuler => {
                rhs(&*y, t, &mut ws.k1[..])?;
                for (yi, ki) in y.iter_mut().zip(&ws.k1) {
                    *yi += dt * ki;
                }
                Ok(())
            }
        }
    }
}

fn rk4_step(
    rhs: &mut Rhs<'_>,
    t: f64,
    y: &mut [f64],
    dt: f64,
    ws: &mut Workspace,
) -> SolverResult<()> {
    let n = y.len();
    let Workspace {
        k1,
        k2,
        k3,
        k4,
        ytmp,
    } = ws;

    rhs(&*y, t, &mut k1[..])?;

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k1[i];
    }
    rhs(&ytmp[..], t + 0.5 * dt, &mut k2[..])?;

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k2[i];
    }
    rhs(&ytmp[..], t + 0.5 * dt, &mut k3[..])?;

    for i in 0..n {
        ytmp[i] = y[i] + dt * k3[i];
    }
    rhs(&ytmp[..], t + dt, &mut k4[..])?;

    for i in 0..n {
        y[i] += (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    Ok(())
}

impl OdeSolver for FixedStepSolver {
    fn solve(&self, rhs: &mut Rhs<'_>, y0: &[f64], t: &[f64]) -> SolverResult<DMatrix<f64>> {
        if self.substeps == 0 {
            return Err(SolverError::InvalidArg {
                what: "substeps must be positive",
            });
        }
        validate_inputs(y0, t)?;

        let mut out = output_matrix(y0, t.len());
        let mut y = y0.to_vec();
        let mut ws = Workspace::new(y.len());

        for (k, w) in t.windows(2).enumerate() {
            let dt = (w[1] - w[0]) / self.substeps as f64;
            for s in 0..self.substeps {
                let ts = w[0] + s as f64 * dt;
                self.step(rhs, ts, &mut y, dt, &mut ws)?;
            }
            check_finite(&y, w[1])?;
            store_row(&mut out, k + 1, &y);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay(y: &[f64], _t: f64, dydt: &mut [f64]) -> SolverResult<()> {
        dydt[0] = -y[0];
        Ok(())
    }

    #[test]
    fn euler_single_substep_matches_hand_calculation() {
        let solver = FixedStepSolver::forward_euler(1);
        let out = solver.solve(&mut decay, &[1.0], &[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(out[(1, 0)], 0.5);
        assert_eq!(out[(2, 0)], 0.25);
    }

    #[test]
    fn zero_substeps_rejected() {
        let solver = FixedStepSolver::rk4(0);
        assert!(solver.solve(&mut decay, &[1.0], &[0.0, 1.0]).is_err());
    }
}

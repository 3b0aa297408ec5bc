//! Adaptive Dormand–Prince 5(4) integration.

use nalgebra::DMatrix;
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::solver::{OdeSolver, Rhs, check_finite, output_matrix, store_row, validate_inputs};

const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];

// 5th-order weights minus embedded 4th-order weights.
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Adaptive explicit Runge–Kutta with embedded error estimate.
///
/// Steps are shortened to land exactly on every grid point, so output rows
/// are never interpolated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DormandPrince {
    pub rtol: f64,
    pub atol: f64,
    /// Smallest step allowed before giving up
    pub h_min: f64,
    /// Total attempted steps (accepted and rejected) across the whole grid
    pub max_steps: usize,
}

impl Default for DormandPrince {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            h_min: 1e-12,
            max_steps: 100_000,
        }
    }
}

impl DormandPrince {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    fn validate(&self) -> SolverResult<()> {
        if !(self.rtol > 0.0 && self.rtol.is_finite()) {
            return Err(SolverError::InvalidArg {
                what: "rtol must be positive",
            });
        }
        if !(self.atol >= 0.0 && self.atol.is_finite()) {
            return Err(SolverError::InvalidArg {
                what: "atol must be non-negative",
            });
        }
        if !(self.h_min > 0.0) {
            return Err(SolverError::InvalidArg {
                what: "h_min must be positive",
            });
        }
        if self.max_steps == 0 {
            return Err(SolverError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        Ok(())
    }

    /// One trial step; fills `y_new` and returns the scaled RMS error.
    fn attempt(
        &self,
        rhs: &mut Rhs<'_>,
        t: f64,
        y: &[f64],
        h: f64,
        k: &mut [Vec<f64>; 7],
        ytmp: &mut [f64],
        y_new: &mut [f64],
    ) -> SolverResult<f64> {
        let n = y.len();
        rhs(y, t, &mut k[0][..])?;
        for stage in 1..7 {
            for i in 0..n {
                let mut acc = 0.0;
                for (j, a) in A[stage][..stage].iter().enumerate() {
                    acc += a * k[j][i];
                }
                ytmp[i] = y[i] + h * acc;
            }
            rhs(&ytmp[..], t + C[stage] * h, &mut k[stage][..])?;
        }
        // The last stage is evaluated at the 5th-order solution.
        y_new.copy_from_slice(ytmp);

        if n == 0 {
            return Ok(0.0);
        }
        let mut sum = 0.0;
        for i in 0..n {
            let mut err = 0.0;
            for (j, e) in E.iter().enumerate() {
                err += e * k[j][i];
            }
            let scale = self.atol + self.rtol * y[i].abs().max(y_new[i].abs());
            let ratio = if scale > 0.0 {
                h * err / scale
            } else if err == 0.0 {
                0.0
            } else {
                f64::INFINITY
            };
            sum += ratio * ratio;
        }
        Ok((sum / n as f64).sqrt())
    }
}

impl OdeSolver for DormandPrince {
    fn solve(&self, rhs: &mut Rhs<'_>, y0: &[f64], t: &[f64]) -> SolverResult<DMatrix<f64>> {
        self.validate()?;
        validate_inputs(y0, t)?;

        let n = y0.len();
        let mut out = output_matrix(y0, t.len());
        if t.len() == 1 {
            return Ok(out);
        }

        let mut y = y0.to_vec();
        let mut y_new = vec![0.0; n];
        let mut ytmp = vec![0.0; n];
        let mut k: [Vec<f64>; 7] = std::array::from_fn(|_| vec![0.0; n]);

        let mut tc = t[0];
        let mut h = (t[1] - t[0])
            .min((t[t.len() - 1] - t[0]) / 100.0)
            .max(self.h_min);
        let mut attempts = 0usize;
        let mut rejected = 0usize;

        for (row, &target) in t.iter().enumerate().skip(1) {
            while tc < target {
                let remaining = target - tc;
                if remaining < self.h_min {
                    // Closer to the grid point than any step we may take.
                    tc = target;
                    break;
                }
                // Stretch a step that would leave less than h_min behind.
                let last = h + self.h_min >= remaining;
                let step = if last { remaining } else { h };
                if step < self.h_min {
                    return Err(SolverError::StepSizeUnderflow { t: tc, h: step });
                }
                attempts += 1;
                if attempts > self.max_steps {
                    return Err(SolverError::MaxStepsExceeded {
                        max_steps: self.max_steps,
                        t: tc,
                    });
                }

                let err = self.attempt(rhs, tc, &y, step, &mut k, &mut ytmp, &mut y_new)?;
                let factor = if err == 0.0 {
                    MAX_FACTOR
                } else if err.is_finite() {
                    (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                } else {
                    MIN_FACTOR
                };

                if err <= 1.0 {
                    tc = if last { target } else { tc + step };
                    std::mem::swap(&mut y, &mut y_new);
                    check_finite(&y, tc)?;
                    // Don't let a short landing step shrink the next one.
                    h = if last { h.max(step * factor) } else { step * factor };
                } else {
                    rejected += 1;
                    h = step * factor;
                }
            }
            store_row(&mut out, row, &y);
        }

        debug!(attempts, rejected, "Dormand-Prince integration finished");
        Ok(out)
    }
}

//! Network-coupled compartmental model.

use std::collections::BTreeMap;
use std::sync::Arc;

use ps_core::{RunContext, floor_at_zero};
use ps_expr::VariableSource;
use ps_model::{CompartmentalModel, NamedValues};
use ps_solver::{OdeSolver, SolverError};
use tracing::{debug, info};

use crate::error::{NetworkError, NetworkResult};
use crate::history::{History, Trajectory};
use crate::network::Network;
use crate::state::{FullState, StateLayout};

/// Name under which each patch's rates see its force of infection.
pub const FORCE_OF_INFECTION: &str = "lambda_i";

const DEFAULT_INFECTED: &str = "I";

/// Extra names for one patch's rates, given `(t, patch, patch_values)`.
pub type PatchExtrasFn<'a> = dyn Fn(f64, usize, &[f64]) -> NamedValues + 'a;

/// Force of infection layered over optional provider values.
struct PatchExtras<'a> {
    force: f64,
    provided: Option<&'a NamedValues>,
}

impl VariableSource for PatchExtras<'_> {
    fn lookup(&self, name: &str) -> Option<f64> {
        if name == FORCE_OF_INFECTION {
            Some(self.force)
        } else {
            self.provided.and_then(|p| p.get(name))
        }
    }
}

/// One base model replicated over every patch of a network.
///
/// Immutable once built; runs keep their own state and history, so one
/// instance can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    base: CompartmentalModel,
    network: Arc<Network>,
    layout: Arc<StateLayout>,
    infected: Option<usize>,
    infected_name: String,
}

impl NetworkModel {
    pub fn new(
        base: CompartmentalModel,
        num_patches: usize,
        network: Arc<Network>,
    ) -> NetworkResult<Self> {
        if network.num_patches() != num_patches {
            return Err(NetworkError::DimensionMismatch {
                expected: num_patches,
                network: network.num_patches(),
            });
        }
        let layout = Arc::new(StateLayout::new(base.compartments(), num_patches));
        let infected = base.compartment_index(DEFAULT_INFECTED);
        Ok(Self {
            base,
            network,
            layout,
            infected,
            infected_name: DEFAULT_INFECTED.to_string(),
        })
    }

    /// Couple patches through `name` instead of `I`.
    pub fn with_infected_compartment(mut self, name: &str) -> NetworkResult<Self> {
        let idx = self
            .base
            .compartment_index(name)
            .ok_or_else(|| NetworkError::MissingCompartment {
                name: name.to_string(),
            })?;
        self.infected = Some(idx);
        self.infected_name = name.to_string();
        Ok(self)
    }

    pub fn base(&self) -> &CompartmentalModel {
        &self.base
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    pub fn layout(&self) -> &Arc<StateLayout> {
        &self.layout
    }

    pub fn num_patches(&self) -> usize {
        self.layout.num_patches()
    }

    /// Qualified keys, patch-major then compartment order.
    pub fn all_compartments(&self) -> &[String] {
        self.layout.keys()
    }

    pub fn infected_compartment(&self) -> &str {
        &self.infected_name
    }

    /// Same network and layout with the base parameters replaced.
    pub fn with_parameters(&self, parameters: BTreeMap<String, f64>) -> Self {
        Self {
            base: self.base.with_parameters(parameters),
            ..self.clone()
        }
    }

    pub fn state_from_pairs<K: AsRef<str>>(
        &self,
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> NetworkResult<FullState> {
        FullState::from_pairs(self.layout.clone(), pairs)
    }

    pub fn state_from_patches(&self, patches: &[NamedValues]) -> NetworkResult<FullState> {
        FullState::from_patches(self.layout.clone(), patches)
    }

    /// `force_i = Σ_j w[i][j] · I_j / N_j` over a flat state.
    pub fn compute_forces(&self, values: &[f64]) -> NetworkResult<Vec<f64>> {
        let infected = self.infected.ok_or_else(|| NetworkError::MissingCompartment {
            name: self.infected_name.clone(),
        })?;
        if values.len() != self.layout.len() {
            return Err(NetworkError::StateLength {
                expected: self.layout.len(),
                got: values.len(),
            });
        }
        let n = self.num_patches();
        let mut prevalence = Vec::with_capacity(n);
        for j in 0..n {
            let patch = &values[self.layout.patch_range(j)];
            let total: f64 = patch.iter().sum();
            if total == 0.0 || !total.is_finite() {
                return Err(NetworkError::DivisionByZeroForce { patch: j, total });
            }
            prevalence.push(patch[infected] / total);
        }
        let weights = self.network.weights();
        Ok((0..n)
            .map(|i| (0..n).map(|j| weights[(i, j)] * prevalence[j]).sum())
            .collect())
    }

    /// Forces for a full state.
    pub fn compute_force_of_infection(&self, state: &FullState) -> NetworkResult<Vec<f64>> {
        self.check_layout(state)?;
        self.compute_forces(state.values())
    }

    /// Deltas for every patch of `values`, written patch-major into `out`.
    fn all_deltas(
        &self,
        values: &[f64],
        t: f64,
        extras_fn: Option<&PatchExtrasFn<'_>>,
        out: &mut [f64],
    ) -> NetworkResult<()> {
        let forces = self.compute_forces(values)?;
        for (patch, force) in forces.into_iter().enumerate() {
            let range = self.layout.patch_range(patch);
            let patch_values = &values[range.clone()];
            let provided = extras_fn.map(|f| f(t, patch, patch_values));
            let extras = PatchExtras {
                force,
                provided: provided.as_ref(),
            };
            self.base
                .compute_deltas_into(patch_values, Some(&extras), &mut out[range])?;
        }
        Ok(())
    }

    fn check_layout(&self, state: &FullState) -> NetworkResult<()> {
        if Arc::ptr_eq(state.layout(), &self.layout) || **state.layout() == *self.layout {
            Ok(())
        } else {
            Err(NetworkError::DimensionMismatch {
                expected: self.layout.len(),
                network: state.layout().len(),
            })
        }
    }

    /// Difference-equation run: one grid point is one step.
    ///
    /// Deltas are added without scaling by the grid spacing, then every
    /// value is floored at zero.
    pub fn simulate_discrete(
        &self,
        ctx: &mut RunContext,
        y0: &FullState,
        t: &[f64],
    ) -> NetworkResult<Trajectory> {
        self.simulate_discrete_with(ctx, y0, t, |_, _, _| Ok::<(), NetworkError>(()))
    }

    /// [`Self::simulate_discrete`] with `hook` called on the clamped state
    /// after every step, before it is recorded.
    pub fn simulate_discrete_with<E, F>(
        &self,
        ctx: &mut RunContext,
        y0: &FullState,
        t: &[f64],
        mut hook: F,
    ) -> Result<Trajectory, E>
    where
        E: From<NetworkError>,
        F: FnMut(&mut FullState, f64, &mut RunContext) -> Result<(), E>,
    {
        let span = ctx.span();
        let _enter = span.enter();

        if t.is_empty() {
            return Err(NetworkError::EmptyTimeGrid.into());
        }
        self.check_layout(y0)?;
        self.check_finite(y0.values(), t[0])?;
        info!(
            patches = self.num_patches(),
            steps = t.len() - 1,
            "discrete simulation started"
        );

        let mut state = y0.clone();
        let mut history = History::new(self.layout.clone());
        history.push(&state);
        let mut deltas = vec![0.0; self.layout.len()];

        for &tk in &t[1..] {
            self.all_deltas(state.values(), tk, None, &mut deltas)?;

            let mut clamped = 0;
            for (v, d) in state.values_mut().iter_mut().zip(&deltas) {
                let next = *v + d;
                if next < 0.0 {
                    clamped += 1;
                }
                *v = floor_at_zero(next);
            }
            if clamped > 0 {
                debug!(t = tk, clamped, "floored negative compartments at zero");
                ctx.record_clamps(clamped);
            }
            self.check_finite(state.values(), tk)?;

            hook(&mut state, tk, &mut *ctx)?;
            ctx.record_step(tk);
            history.push(&state);
        }

        info!(
            steps = ctx.stats().steps,
            clamped = ctx.stats().clamped_values,
            "discrete simulation finished"
        );
        Ok(Trajectory {
            times: t.to_vec(),
            history,
        })
    }

    /// Continuous-time run through `solver`. No clamping is applied.
    pub fn simulate_ode(
        &self,
        ctx: &mut RunContext,
        y0: &FullState,
        t: &[f64],
        solver: &dyn OdeSolver,
        extras_fn: Option<&PatchExtrasFn<'_>>,
    ) -> NetworkResult<Trajectory> {
        let span = ctx.span();
        let _enter = span.enter();

        if t.is_empty() {
            return Err(NetworkError::EmptyTimeGrid);
        }
        self.check_layout(y0)?;
        debug!(
            patches = self.num_patches(),
            points = t.len(),
            "ODE simulation started"
        );

        let mut failure: Option<NetworkError> = None;
        let mut evaluations = 0usize;
        let result = {
            let mut rhs = |y: &[f64], tk: f64, dydt: &mut [f64]| -> Result<(), SolverError> {
                evaluations += 1;
                self.all_deltas(y, tk, extras_fn, dydt).map_err(|e| {
                    let message = e.to_string();
                    failure = Some(e);
                    SolverError::RhsFailed { t: tk, message }
                })
            };
            solver.solve(&mut rhs, y0.values(), t)
        };
        for _ in 0..evaluations {
            ctx.record_rhs();
        }

        let matrix = match (result, failure) {
            (Err(_), Some(original)) => return Err(original),
            (Err(e), None) => return Err(e.into()),
            (Ok(matrix), _) => matrix,
        };
        let history = History::from_matrix(self.layout.clone(), &matrix, t.len())?;
        for (k, &tk) in t.iter().enumerate().skip(1) {
            self.check_finite(&history.row(k), tk)?;
            ctx.record_step(tk);
        }
        debug!(rhs_evaluations = evaluations, "ODE simulation finished");
        Ok(Trajectory {
            times: t.to_vec(),
            history,
        })
    }

    fn check_finite(&self, values: &[f64], t: f64) -> NetworkResult<()> {
        match values.iter().position(|v| !v.is_finite()) {
            None => Ok(()),
            Some(i) => Err(NetworkError::NonFinite {
                key: self.layout.keys()[i].clone(),
                t,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use ps_model::Transition;

    use super::*;

    fn sir() -> CompartmentalModel {
        CompartmentalModel::new(
            vec!["S".into(), "I".into(), "R".into()],
            BTreeMap::from([("beta".into(), 0.3), ("gamma".into(), 0.1)]),
            vec![
                Transition::flow("S", "I", "beta*S*lambda_i").unwrap(),
                Transition::flow("I", "R", "gamma*I").unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn dimension_must_match_network() {
        let err = NetworkModel::new(sir(), 3, Arc::new(Network::identity(2))).unwrap_err();
        assert_eq!(
            err,
            NetworkError::DimensionMismatch {
                expected: 3,
                network: 2
            }
        );
    }

    #[test]
    fn infected_compartment_must_exist() {
        let model = NetworkModel::new(sir(), 1, Arc::new(Network::identity(1))).unwrap();
        assert!(matches!(
            model.with_infected_compartment("E"),
            Err(NetworkError::MissingCompartment { .. })
        ));
    }

    #[test]
    fn forces_follow_row_weights() {
        let net = Network::from_rows(&[vec![0.0, 1.0], vec![0.5, 0.0]]).unwrap();
        let model = NetworkModel::new(sir(), 2, Arc::new(net)).unwrap();
        let forces = model
            .compute_forces(&[90.0, 10.0, 0.0, 75.0, 25.0, 0.0])
            .unwrap();
        assert_eq!(forces, vec![0.25, 0.05]);
    }

    #[test]
    fn empty_patch_has_no_force() {
        let model = NetworkModel::new(sir(), 2, Arc::new(Network::identity(2))).unwrap();
        let err = model
            .compute_forces(&[90.0, 10.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap_err();
        assert_eq!(
            err,
            NetworkError::DivisionByZeroForce {
                patch: 1,
                total: 0.0
            }
        );
    }

    #[test]
    fn short_state_slice_is_rejected() {
        let model = NetworkModel::new(sir(), 2, Arc::new(Network::identity(2))).unwrap();
        assert_eq!(
            model.compute_forces(&[90.0, 10.0, 0.0]),
            Err(NetworkError::StateLength {
                expected: 6,
                got: 3
            })
        );
    }
}

//! Simulation runner.

use std::sync::Arc;

use ps_core::RunContext;
use ps_model::CompartmentalModel;
use ps_network::{FullState, History, NetworkError, NetworkModel, StateLayout, Trajectory};
use ps_solver::{OdeSolver, SolverError};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::intervention::Intervention;
use crate::mode::SimulationMode;

/// What an ODE run integrates: the coupled network or one bare patch.
#[derive(Clone, Copy)]
enum OdeTarget<'a> {
    Network(&'a NetworkModel),
    Patch(&'a CompartmentalModel),
}

impl OdeTarget<'_> {
    fn integrate(
        self,
        ctx: &mut RunContext,
        y0: &FullState,
        t: &[f64],
        solver: &dyn OdeSolver,
    ) -> SimResult<Trajectory> {
        match self {
            OdeTarget::Network(network) => Ok(network.simulate_ode(ctx, y0, t, solver, None)?),
            OdeTarget::Patch(model) => integrate_patch(model, ctx, y0, t, solver),
        }
    }
}

/// Single-patch integration straight through the model's right-hand side.
fn integrate_patch(
    model: &CompartmentalModel,
    ctx: &mut RunContext,
    y0: &FullState,
    t: &[f64],
    solver: &dyn OdeSolver,
) -> SimResult<Trajectory> {
    if t.is_empty() {
        return Err(NetworkError::EmptyTimeGrid.into());
    }
    let mut failure = None;
    let mut evaluations = 0usize;
    let result = {
        let mut rhs = |y: &[f64], tk: f64, dydt: &mut [f64]| -> Result<(), SolverError> {
            evaluations += 1;
            model.compute_deltas_into(y, None, dydt).map_err(|e| {
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
        (Err(_), Some(original)) => return Err(original.into()),
        (Err(e), None) => return Err(e.into()),
        (Ok(matrix), _) => matrix,
    };
    let history = History::from_matrix(y0.layout().clone(), &matrix, t.len())?;
    for &tk in &t[1..] {
        ctx.record_step(tk);
    }
    Ok(Trajectory {
        times: t.to_vec(),
        history,
    })
}

/// Run every intervention in order; the first failure aborts the rest.
fn apply_all(
    interventions: &mut [Box<dyn Intervention>],
    state: &mut FullState,
    t: f64,
    ctx: &mut RunContext,
) -> SimResult<()> {
    for intervention in interventions.iter_mut() {
        intervention
            .apply(state, t)
            .map_err(|e| SimError::Intervention {
                name: intervention.name().to_string(),
                t,
                message: e.to_string(),
            })?;
        ctx.record_intervention();
    }
    Ok(())
}

/// Orchestrates one run in a fixed [`SimulationMode`].
///
/// Build with the chained setters, then call [`Simulation::run`]. The
/// discrete mode needs a network model. The ODE mode needs a solver plus
/// either a network model or a bare compartmental model, which is then
/// integrated as a single patch with state keys `"{compartment}_0"`.
pub struct Simulation {
    mode: SimulationMode,
    model: Option<CompartmentalModel>,
    network: Option<Arc<NetworkModel>>,
    initial: Option<FullState>,
    t: Vec<f64>,
    solver: Option<Box<dyn OdeSolver>>,
    interventions: Vec<Box<dyn Intervention>>,
}

impl Simulation {
    pub fn new(mode: SimulationMode) -> Self {
        Self {
            mode,
            model: None,
            network: None,
            initial: None,
            t: Vec::new(),
            solver: None,
            interventions: Vec::new(),
        }
    }

    /// Parse the mode from `"discrete"` or `"ode"`.
    pub fn from_mode_name(mode: &str) -> SimResult<Self> {
        Ok(Self::new(mode.parse()?))
    }

    pub fn model(mut self, model: CompartmentalModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn network(mut self, network: impl Into<Arc<NetworkModel>>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn initial_state(mut self, state: FullState) -> Self {
        self.initial = Some(state);
        self
    }

    pub fn time_grid(mut self, t: Vec<f64>) -> Self {
        self.t = t;
        self
    }

    pub fn solver(mut self, solver: impl OdeSolver + 'static) -> Self {
        self.solver = Some(Box::new(solver));
        self
    }

    pub fn boxed_solver(mut self, solver: Box<dyn OdeSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn intervention(mut self, intervention: impl Intervention + 'static) -> Self {
        self.interventions.push(Box::new(intervention));
        self
    }

    pub fn boxed_intervention(mut self, intervention: Box<dyn Intervention>) -> Self {
        self.interventions.push(intervention);
        self
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    pub fn time(&self) -> &[f64] {
        &self.t
    }

    pub fn initial(&self) -> Option<&FullState> {
        self.initial.as_ref()
    }

    pub fn num_interventions(&self) -> usize {
        self.interventions.len()
    }

    /// Replace the initial state.
    pub fn set_state(&mut self, state: FullState) {
        self.initial = Some(state);
    }

    /// Apply every registered intervention to `state` at `t`, in
    /// registration order. A failure stops the remaining interventions;
    /// changes already made are kept.
    pub fn apply_interventions(&mut self, state: &mut FullState, t: f64) -> SimResult<()> {
        let mut ctx = RunContext::new("interventions");
        apply_all(&mut self.interventions, state, t, &mut ctx)
    }

    /// Layout a state for this simulation must use.
    pub fn layout(&self) -> Option<Arc<StateLayout>> {
        match (&self.network, &self.model) {
            (Some(network), _) => Some(network.layout().clone()),
            (None, Some(model)) => Some(Arc::new(StateLayout::new(model.compartments(), 1))),
            (None, None) => None,
        }
    }

    pub fn run(&mut self, ctx: &mut RunContext) -> SimResult<Trajectory> {
        let span = ctx.span();
        let _enter = span.enter();
        info!(mode = %self.mode, points = self.t.len(), "simulation started");

        let Self {
            mode,
            model,
            network,
            initial,
            t,
            solver,
            interventions,
        } = self;

        for intervention in interventions.iter_mut() {
            intervention.reset();
        }

        let trajectory = match mode {
            SimulationMode::Discrete => {
                let network = network.as_ref().ok_or(SimError::Unimplemented {
                    what: "discrete single-patch simulation",
                })?;
                let y0 = initial.as_ref().ok_or(SimError::MissingInitialState)?;
                network.simulate_discrete_with(ctx, y0, t, |state, tk, ctx| {
                    apply_all(interventions, state, tk, ctx)
                })?
            }
            SimulationMode::Ode => {
                let solver = solver.as_deref().ok_or(SimError::MissingSolver)?;
                let target = match (network.as_deref(), model.as_ref()) {
                    (Some(network), _) => OdeTarget::Network(network),
                    (None, Some(model)) => OdeTarget::Patch(model),
                    (None, None) => {
                        return Err(SimError::Unimplemented {
                            what: "ODE simulation without a model",
                        });
                    }
                };
                let y0 = initial.as_ref().ok_or(SimError::MissingInitialState)?;
                if let OdeTarget::Patch(model) = target {
                    let expected = StateLayout::new(model.compartments(), 1);
                    if **y0.layout() != expected {
                        return Err(NetworkError::DimensionMismatch {
                            expected: expected.len(),
                            network: y0.layout().len(),
                        }
                        .into());
                    }
                }
                if interventions.is_empty() {
                    target.integrate(ctx, y0, t, solver)?
                } else {
                    piecewise(target, ctx, y0, t, solver, interventions)?
                }
            }
        };

        info!(
            steps = ctx.stats().steps,
            interventions = ctx.stats().interventions_applied,
            elapsed_s = ctx.elapsed_s(),
            "simulation finished"
        );
        Ok(trajectory)
    }
}

/// Integrate one grid interval at a time, applying interventions at every
/// grid point after the first.
fn piecewise(
    target: OdeTarget<'_>,
    ctx: &mut RunContext,
    y0: &FullState,
    t: &[f64],
    solver: &dyn OdeSolver,
    interventions: &mut [Box<dyn Intervention>],
) -> SimResult<Trajectory> {
    if t.is_empty() {
        return Err(NetworkError::EmptyTimeGrid.into());
    }
    debug!(intervals = t.len() - 1, "integrating piecewise");
    let mut history = History::new(y0.layout().clone());
    history.push(y0);
    let mut state = y0.clone();
    for window in t.windows(2) {
        let segment = target.integrate(ctx, &state, window, solver)?;
        state = segment.history.state_at(1)?;
        apply_all(interventions, &mut state, window[1], ctx)?;
        history.push(&state);
    }
    Ok(Trajectory {
        times: t.to_vec(),
        history,
    })
}

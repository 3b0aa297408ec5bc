//! The compartmental model and its rate engine.

use std::collections::BTreeMap;

use ps_expr::{NamedSlice, Scope, VariableSource};

use crate::error::{ModelError, ModelResult};
use crate::transition::Transition;
use crate::values::NamedValues;

/// Resolved compartment indices for one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Endpoints {
    from: Option<usize>,
    to: Option<usize>,
}

/// Immutable model definition.
///
/// Rates are evaluated against a scope made of, in increasing precedence,
/// the patch state, the model parameters and the caller's extras. Every rate
/// is evaluated before any delta is accumulated, so a failing transition
/// never leaves partial deltas behind.
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentalModel {
    compartments: Vec<String>,
    parameters: BTreeMap<String, f64>,
    transitions: Vec<Transition>,
    endpoints: Vec<Endpoints>,
}

impl CompartmentalModel {
    pub fn new(
        compartments: Vec<String>,
        parameters: BTreeMap<String, f64>,
        transitions: Vec<Transition>,
    ) -> ModelResult<Self> {
        if compartments.is_empty() {
            return Err(ModelError::EmptyModel);
        }
        for (i, name) in compartments.iter().enumerate() {
            if compartments[..i].contains(name) {
                return Err(ModelError::DuplicateCompartment { name: name.clone() });
            }
        }

        let resolve = |name: &Option<String>, transition: usize| -> ModelResult<Option<usize>> {
            match name {
                None => Ok(None),
                Some(name) => compartments
                    .iter()
                    .position(|c| c == name)
                    .map(Some)
                    .ok_or_else(|| ModelError::UnknownCompartment {
                        name: name.clone(),
                        transition,
                    }),
            }
        };
        let endpoints = transitions
            .iter()
            .enumerate()
            .map(|(k, t)| {
                Ok(Endpoints {
                    from: resolve(&t.from, k)?,
                    to: resolve(&t.to, k)?,
                })
            })
            .collect::<ModelResult<Vec<_>>>()?;

        Ok(Self {
            compartments,
            parameters,
            transitions,
            endpoints,
        })
    }

    pub fn compartments(&self) -> &[String] {
        &self.compartments
    }

    pub fn num_compartments(&self) -> usize {
        self.compartments.len()
    }

    pub fn compartment_index(&self, name: &str) -> Option<usize> {
        self.compartments.iter().position(|c| c == name)
    }

    pub fn parameters(&self) -> &BTreeMap<String, f64> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Same compartments and transitions, parameters replaced wholesale.
    pub fn with_parameters(&self, parameters: BTreeMap<String, f64>) -> Self {
        Self {
            parameters,
            ..self.clone()
        }
    }

    /// Same model with one parameter set or overridden.
    pub fn with_parameter(&self, name: impl Into<String>, value: f64) -> Self {
        let mut parameters = self.parameters.clone();
        parameters.insert(name.into(), value);
        self.with_parameters(parameters)
    }

    /// Evaluate every transition rate against `scope`, in declaration order.
    pub fn evaluate_rates(&self, scope: &dyn VariableSource) -> ModelResult<Vec<f64>> {
        self.transitions
            .iter()
            .enumerate()
            .map(|(k, t)| {
                t.rate
                    .evaluate(scope)
                    .map_err(|e| ModelError::from_evaluation(e, k, t.rate.source()))
            })
            .collect()
    }

    /// Per-compartment deltas for one patch.
    ///
    /// `state` may hold compartments in any order; names it lacks are only an
    /// error if a rate references them. Every declared compartment appears in
    /// the result, in declaration order.
    pub fn compute_transition_rates(
        &self,
        state: &NamedValues,
        extras: Option<&dyn VariableSource>,
    ) -> ModelResult<NamedValues> {
        let scope = self.scope(state, extras);
        let rates = self.evaluate_rates(&scope)?;
        let mut deltas = vec![0.0; self.compartments.len()];
        self.accumulate(&rates, &mut deltas);
        Ok(NamedValues::zip(&self.compartments, &deltas))
    }

    /// Slice form of [`Self::compute_transition_rates`].
    ///
    /// `values` is the patch state in declaration order; `out` is overwritten
    /// with the deltas.
    pub fn compute_deltas_into(
        &self,
        values: &[f64],
        extras: Option<&dyn VariableSource>,
        out: &mut [f64],
    ) -> ModelResult<()> {
        self.check_len(values.len())?;
        self.check_len(out.len())?;
        let state = NamedSlice::new(&self.compartments, values);
        let scope = self.scope(&state, extras);
        let rates = self.evaluate_rates(&scope)?;
        out.fill(0.0);
        self.accumulate(&rates, out);
        Ok(())
    }

    /// Single-patch ODE right-hand side.
    ///
    /// `extras_fn` receives `(t, y)` and supplies extra names for the rates.
    pub fn ode_rhs(
        &self,
        y: &[f64],
        t: f64,
        extras_fn: Option<&dyn Fn(f64, &[f64]) -> NamedValues>,
    ) -> ModelResult<Vec<f64>> {
        let extras = extras_fn.map(|f| f(t, y));
        let mut dydt = vec![0.0; self.compartments.len()];
        self.compute_deltas_into(
            y,
            extras.as_ref().map(|e| e as &dyn VariableSource),
            &mut dydt,
        )?;
        Ok(dydt)
    }

    fn scope<'a>(
        &'a self,
        state: &'a dyn VariableSource,
        extras: Option<&'a dyn VariableSource>,
    ) -> Scope<'a> {
        let scope = Scope::new()
            .with_layer(state)
            .with_layer(&self.parameters);
        match extras {
            Some(extras) => scope.with_layer(extras),
            None => scope,
        }
    }

    fn accumulate(&self, rates: &[f64], deltas: &mut [f64]) {
        for (rate, ends) in rates.iter().zip(&self.endpoints) {
            if let Some(from) = ends.from {
                deltas[from] -= rate;
            }
            if let Some(to) = ends.to {
                deltas[to] += rate;
            }
        }
    }

    fn check_len(&self, got: usize) -> ModelResult<()> {
        if got != self.compartments.len() {
            return Err(ModelError::StateLength {
                expected: self.compartments.len(),
                got,
            });
        }
        Ok(())
    }
}

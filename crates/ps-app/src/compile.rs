//! Scenario → runnable simulation.

use std::sync::Arc;

use ps_model::CompartmentalModel;
use ps_network::{FullState, Network, NetworkBuilder, NetworkModel};
use ps_project::{InterventionDef, ModelDef, NetworkDef, Scenario, ScenarioInputs, SolverDef};
use ps_sim::{
    CustomModel, DiseaseModel, Intervention, ModelRegistry, MoveFraction, SeedInfections,
    Simulation,
};
use ps_solver::{DormandPrince, FixedStepSolver, OdeSolver};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// A scenario with its inputs loaded and every engine object built.
///
/// Shareable across threads: each call to [`CompiledScenario::simulation`]
/// produces a fresh simulation with its own solver and interventions, while
/// the network is shared.
pub struct CompiledScenario {
    pub scenario: Scenario,
    pub inputs: ScenarioInputs,
    pub disease: Box<dyn DiseaseModel>,
    pub network_model: Arc<NetworkModel>,
    pub initial: FullState,
}

impl CompiledScenario {
    pub fn regions(&self) -> &[String] {
        self.network_model.network().regions()
    }

    pub fn network(&self) -> &Arc<Network> {
        self.network_model.network()
    }

    pub fn compartments(&self) -> &[String] {
        self.network_model.base().compartments()
    }

    pub fn infected_compartment(&self) -> &str {
        self.disease.infected_compartment()
    }

    /// Simulation for the scenario as written.
    pub fn simulation(&self) -> AppResult<Simulation> {
        self.assemble(self.network_model.clone())
    }

    /// Simulation with one base-model parameter overridden.
    pub fn simulation_with_parameter(&self, name: &str, value: f64) -> AppResult<Simulation> {
        let base = self.network_model.base();
        if base.parameter(name).is_none() {
            return Err(AppError::InvalidInput(format!(
                "model `{}` has no parameter `{name}`",
                self.disease.name()
            )));
        }
        let mut parameters = base.parameters().clone();
        parameters.insert(name.to_string(), value);
        self.assemble(Arc::new(self.network_model.with_parameters(parameters)))
    }

    fn assemble(&self, network_model: Arc<NetworkModel>) -> AppResult<Simulation> {
        let mut simulation = Simulation::new(self.scenario.mode)
            .network(network_model)
            .initial_state(self.initial.clone())
            .time_grid(self.scenario.time.grid())
            .boxed_solver(build_solver(&self.scenario.solver));
        for intervention in build_interventions(self, &self.scenario)? {
            simulation = simulation.boxed_intervention(intervention);
        }
        Ok(simulation)
    }
}

/// Resolve the scenario's model through the registry or build it inline.
pub fn build_disease_model(
    model: &ModelDef,
    registry: &ModelRegistry,
) -> AppResult<Box<dyn DiseaseModel>> {
    match model {
        ModelDef::Builtin { name, parameters } => Ok(registry.create(name, parameters)?),
        ModelDef::Custom {
            name,
            compartments,
            parameters,
            transitions,
            infected,
        } => {
            let model = CompartmentalModel::new(
                compartments.clone(),
                parameters.clone(),
                transitions.clone(),
            )?;
            Ok(Box::new(CustomModel::new(name.clone(), model, infected.clone())?))
        }
    }
}

pub fn build_solver(solver: &SolverDef) -> Box<dyn OdeSolver> {
    match *solver {
        SolverDef::Rk4 { substeps } => Box::new(FixedStepSolver::rk4(substeps)),
        SolverDef::Euler { substeps } => Box::new(FixedStepSolver::forward_euler(substeps)),
        SolverDef::Dopri5 { rtol, atol } => Box::new(DormandPrince::new(rtol, atol)),
    }
}

/// Patches in file order; edges and self-coupling from the network section.
pub fn build_network(inputs: &ScenarioInputs, network: &NetworkDef) -> AppResult<Network> {
    let mut builder = NetworkBuilder::new();
    for patch in &inputs.patches {
        builder.add_patch(patch.region.clone())?;
    }
    for edge in &inputs.edges {
        builder.add_edge_record(edge)?;
    }
    if let Some(weight) = network.self_coupling {
        builder = builder.with_self_coupling(weight);
    }
    Ok(builder.build()?)
}

/// Seeds dated after the start date plus the scenario's declared
/// interventions, in that order.
pub fn build_interventions(
    compiled: &CompiledScenario,
    scenario: &Scenario,
) -> AppResult<Vec<Box<dyn Intervention>>> {
    let mut out: Vec<Box<dyn Intervention>> = Vec::new();

    let susceptible = compiled
        .compartments()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Model("model has no compartments".to_string()))?;
    for (patch, day, count) in compiled.inputs.later_seeds(scenario.time.start_date) {
        let seed = SeedInfections::new(patch, day as f64, count)?
            .with_compartments(susceptible.clone(), compiled.infected_compartment());
        out.push(Box::new(seed));
    }

    for def in &scenario.interventions {
        match def {
            InterventionDef::MoveFraction {
                from,
                to,
                fraction,
                start,
                end,
                regions,
            } => {
                let mut intervention = MoveFraction::new(from.clone(), to.clone(), *fraction)?
                    .during(
                        start.unwrap_or(f64::NEG_INFINITY),
                        end.unwrap_or(f64::INFINITY),
                    );
                if let Some(regions) = regions {
                    let patches = regions
                        .iter()
                        .map(|r| {
                            compiled.network().region_index(r).ok_or_else(|| {
                                AppError::Validation(format!("unknown region `{r}`"))
                            })
                        })
                        .collect::<AppResult<Vec<_>>>()?;
                    intervention = intervention.for_patches(patches);
                }
                out.push(Box::new(intervention));
            }
        }
    }
    Ok(out)
}

/// Load inputs, build the model, network and initial state.
pub fn compile_scenario(scenario: Scenario, registry: &ModelRegistry) -> AppResult<CompiledScenario> {
    let inputs = ScenarioInputs::load(&scenario)?;
    let disease = build_disease_model(&scenario.model, registry)?;
    let network = Arc::new(build_network(&inputs, &scenario.network)?);
    let network_model = Arc::new(disease.network_model(network)?);

    let seeds = inputs.initial_seeds(scenario.time.start_date);
    let patches = inputs
        .patches
        .iter()
        .map(|patch| disease.initialize(patch, &seeds))
        .collect::<Vec<_>>();
    let initial = network_model.state_from_patches(&patches)?;
    debug!(seeded = seeds.len(), "initial state built");

    info!(
        scenario = %scenario.name,
        model = disease.name(),
        patches = network_model.num_patches(),
        "compiled scenario"
    );
    Ok(CompiledScenario {
        scenario,
        inputs,
        disease,
        network_model,
        initial,
    })
}

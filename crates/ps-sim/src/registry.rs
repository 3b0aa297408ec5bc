//! Named disease models resolved at startup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ps_core::{PatchRecord, SeedRecord};
use ps_model::{CompartmentalModel, NamedValues, Transition};
use ps_network::{Network, NetworkModel};

use crate::error::{SimError, SimResult};

/// A disease model that can seed patches and couple them over a network.
pub trait DiseaseModel: Send + Sync {
    fn name(&self) -> &str;

    fn base_model(&self) -> &CompartmentalModel;

    /// Compartment whose prevalence drives cross-patch coupling.
    fn infected_compartment(&self) -> &str {
        "I"
    }

    /// Initial compartments for one patch.
    fn initialize(&self, patch: &PatchRecord, seeds: &[SeedRecord]) -> NamedValues {
        seeded_patch(self.base_model(), self.infected_compartment(), patch, seeds)
    }

    fn network_model(&self, network: Arc<Network>) -> SimResult<NetworkModel> {
        let n = network.num_patches();
        let model = NetworkModel::new(self.base_model().clone(), n, network)?
            .with_infected_compartment(self.infected_compartment())?;
        Ok(model)
    }
}

/// First seed for the patch's region goes into `infected` (capped at the
/// population), the remainder into the first compartment, zero elsewhere.
pub fn seeded_patch(
    model: &CompartmentalModel,
    infected: &str,
    patch: &PatchRecord,
    seeds: &[SeedRecord],
) -> NamedValues {
    let seeded = seeds
        .iter()
        .find(|s| s.region == patch.region)
        .map_or(0.0, |s| s.count.min(patch.population));
    let susceptible = model.compartments().first().map(String::as_str);
    model
        .compartments()
        .iter()
        .map(|c| {
            let value = if c == infected {
                seeded
            } else if Some(c.as_str()) == susceptible {
                patch.population - seeded
            } else {
                0.0
            };
            (c.clone(), value)
        })
        .collect()
}

/// User-defined model, e.g. from a scenario file.
#[derive(Debug, Clone)]
pub struct CustomModel {
    name: String,
    model: CompartmentalModel,
    infected: String,
}

impl CustomModel {
    pub fn new(
        name: impl Into<String>,
        model: CompartmentalModel,
        infected: impl Into<String>,
    ) -> SimResult<Self> {
        let infected = infected.into();
        if model.compartment_index(&infected).is_none() {
            return Err(ps_network::NetworkError::MissingCompartment { name: infected }.into());
        }
        Ok(Self {
            name: name.into(),
            model,
            infected,
        })
    }
}

impl DiseaseModel for CustomModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_model(&self) -> &CompartmentalModel {
        &self.model
    }

    fn infected_compartment(&self) -> &str {
        &self.infected
    }
}

/// Builds a model from user-supplied parameter values.
pub type ModelFactory = fn(&BTreeMap<String, f64>) -> SimResult<Box<dyn DiseaseModel>>;

/// Model name → factory.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    factories: BTreeMap<String, ModelFactory>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `sir`, `seir` and `sirs`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("sir", sir);
        registry.register("seir", seir);
        registry.register("sirs", sirs);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ModelFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(
        &self,
        name: &str,
        parameters: &BTreeMap<String, f64>,
    ) -> SimResult<Box<dyn DiseaseModel>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SimError::UnknownModel {
                name: name.to_string(),
            })?;
        factory(parameters)
    }
}

struct BuiltinModel {
    name: &'static str,
    model: CompartmentalModel,
}

impl DiseaseModel for BuiltinModel {
    fn name(&self) -> &str {
        self.name
    }

    fn base_model(&self) -> &CompartmentalModel {
        &self.model
    }
}

/// Look up a parameter under its canonical name or any alias.
fn parameter(
    model: &str,
    parameters: &BTreeMap<String, f64>,
    names: &[&str],
) -> SimResult<f64> {
    names
        .iter()
        .find_map(|n| parameters.get(*n).copied())
        .ok_or_else(|| SimError::MissingParameter {
            model: model.to_string(),
            name: names[0].to_string(),
        })
}

fn builtin(
    name: &'static str,
    compartments: &[&str],
    parameters: BTreeMap<String, f64>,
    transitions: &[(&str, &str, &str)],
) -> SimResult<Box<dyn DiseaseModel>> {
    let transitions = transitions
        .iter()
        .map(|(from, to, rate)| Transition::flow(from, to, rate))
        .collect::<Result<Vec<_>, _>>()?;
    let model = CompartmentalModel::new(
        compartments.iter().map(|c| c.to_string()).collect(),
        parameters,
        transitions,
    )?;
    Ok(Box::new(BuiltinModel { name, model }))
}

fn sir(parameters: &BTreeMap<String, f64>) -> SimResult<Box<dyn DiseaseModel>> {
    let beta = parameter("sir", parameters, &["beta", "InfectionRate"])?;
    let gamma = parameter("sir", parameters, &["gamma", "RecoveryRate"])?;
    builtin(
        "sir",
        &["S", "I", "R"],
        BTreeMap::from([("beta".into(), beta), ("gamma".into(), gamma)]),
        &[("S", "I", "beta*S*lambda_i"), ("I", "R", "gamma*I")],
    )
}

fn seir(parameters: &BTreeMap<String, f64>) -> SimResult<Box<dyn DiseaseModel>> {
    let beta = parameter("seir", parameters, &["beta"])?;
    let sigma = parameter("seir", parameters, &["sigma"])?;
    let gamma = parameter("seir", parameters, &["gamma"])?;
    builtin(
        "seir",
        &["S", "E", "I", "R"],
        BTreeMap::from([
            ("beta".into(), beta),
            ("sigma".into(), sigma),
            ("gamma".into(), gamma),
        ]),
        &[
            ("S", "E", "beta*S*lambda_i"),
            ("E", "I", "sigma*E"),
            ("I", "R", "gamma*I"),
        ],
    )
}

fn sirs(parameters: &BTreeMap<String, f64>) -> SimResult<Box<dyn DiseaseModel>> {
    let beta = parameter("sirs", parameters, &["beta"])?;
    let gamma = parameter("sirs", parameters, &["gamma"])?;
    let omega = parameter("sirs", parameters, &["omega"])?;
    builtin(
        "sirs",
        &["S", "I", "R"],
        BTreeMap::from([
            ("beta".into(), beta),
            ("gamma".into(), gamma),
            ("omega".into(), omega),
        ]),
        &[
            ("S", "I", "beta*S*lambda_i"),
            ("I", "R", "gamma*I"),
            ("R", "S", "omega*R"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_listed_in_order() {
        let registry = ModelRegistry::with_builtins();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["seir", "sir", "sirs"]);
    }

    #[test]
    fn sir_accepts_long_parameter_names() {
        let registry = ModelRegistry::with_builtins();
        let params = BTreeMap::from([("InfectionRate".into(), 0.4), ("RecoveryRate".into(), 0.2)]);
        let model = registry.create("sir", &params).unwrap();
        assert_eq!(model.base_model().parameter("beta"), Some(0.4));
        assert_eq!(model.base_model().parameter("gamma"), Some(0.2));
    }

    #[test]
    fn missing_parameter_and_unknown_model() {
        let registry = ModelRegistry::with_builtins();
        let err = registry
            .create("seir", &BTreeMap::from([("beta".into(), 0.4)]))
            .err()
            .unwrap();
        assert_eq!(
            err,
            SimError::MissingParameter {
                model: "seir".into(),
                name: "sigma".into()
            }
        );
        assert!(matches!(
            registry.create("sird", &BTreeMap::new()),
            Err(SimError::UnknownModel { .. })
        ));
    }
}

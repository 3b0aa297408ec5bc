use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use ps_core::{PatchRecord, RunContext, SeedRecord, Tolerances, nearly_equal};
use ps_model::{CompartmentalModel, Transition};
use ps_network::{FullState, Network, StateLayout};
use ps_sim::{
    Intervention, InterventionError, ModelRegistry, MoveFraction, SeedInfections, SimError,
    Simulation, SimulationMode,
};
use ps_solver::{DormandPrince, FixedStepSolver};

fn sir_params() -> BTreeMap<String, f64> {
    BTreeMap::from([("beta".into(), 0.3), ("gamma".into(), 0.1)])
}

fn days(n: usize) -> Vec<f64> {
    (0..=n).map(|d| d as f64).collect()
}

fn two_patch_sir() -> (ps_network::NetworkModel, FullState) {
    let registry = ModelRegistry::with_builtins();
    let sir = registry.create("sir", &sir_params()).unwrap();
    let network = sir.network_model(Arc::new(Network::identity(2))).unwrap();
    let y0 = network
        .state_from_pairs([
            ("S_0", 99.0),
            ("I_0", 1.0),
            ("R_0", 0.0),
            ("S_1", 99.0),
            ("I_1", 1.0),
            ("R_1", 0.0),
        ])
        .unwrap();
    (network, y0)
}

#[test]
fn discrete_run_matches_hand_calculation() {
    let (network, y0) = two_patch_sir();
    let mut sim = Simulation::new(SimulationMode::Discrete)
        .network(network)
        .initial_state(y0)
        .time_grid(days(2));
    let mut ctx = RunContext::new("example");
    let run = sim.run(&mut ctx).unwrap();
    assert!(nearly_equal(
        run.series("I_0").unwrap()[1],
        1.197,
        Tolerances::default()
    ));
    assert_eq!(run.series("I_0"), run.series("I_1"));
}

#[test]
fn discrete_without_network_is_unimplemented() {
    let model = CompartmentalModel::new(vec!["S".into()], BTreeMap::new(), vec![]).unwrap();
    let mut sim = Simulation::new(SimulationMode::Discrete)
        .model(model)
        .time_grid(days(2));
    assert!(matches!(
        sim.run(&mut RunContext::default()),
        Err(SimError::Unimplemented { .. })
    ));
}

#[test]
fn ode_requires_solver() {
    let (network, y0) = two_patch_sir();
    let mut sim = Simulation::new(SimulationMode::Ode)
        .network(network)
        .initial_state(y0)
        .time_grid(days(2));
    assert_eq!(
        sim.run(&mut RunContext::default()).err(),
        Some(SimError::MissingSolver)
    );
}

#[test]
fn mode_names_are_checked() {
    assert!(Simulation::from_mode_name("ode").is_ok());
    assert!(matches!(
        Simulation::from_mode_name("agent"),
        Err(SimError::UnknownMode { .. })
    ));
}

#[test]
fn single_patch_ode_uses_model_directly() {
    let model = CompartmentalModel::new(
        vec!["S".into(), "I".into(), "R".into()],
        BTreeMap::from([("gamma".into(), 0.25)]),
        vec![Transition::flow("I", "R", "gamma*I").unwrap()],
    )
    .unwrap();
    let layout = Arc::new(StateLayout::new(model.compartments(), 1));
    let y0 = FullState::from_values(layout, vec![0.0, 8.0, 0.0]).unwrap();
    let mut sim = Simulation::new(SimulationMode::Ode)
        .model(model)
        .initial_state(y0)
        .time_grid(days(8))
        .solver(DormandPrince::new(1e-9, 1e-12));
    let run = sim.run(&mut RunContext::default()).unwrap();
    let i = run.series("I_0").unwrap();
    assert!(nearly_equal(
        i[8],
        8.0 * (-2.0f64).exp(),
        Tolerances { abs: 1e-7, rel: 1e-7 }
    ));
    assert!(nearly_equal(run.series("R_0").unwrap()[8] + i[8], 8.0, Tolerances::default()));
}

#[test]
fn single_patch_ode_reports_undefined_names() {
    let model = CompartmentalModel::new(
        vec!["S".into(), "I".into()],
        BTreeMap::new(),
        vec![Transition::flow("S", "I", "beta*S").unwrap()],
    )
    .unwrap();
    let layout = Arc::new(StateLayout::new(model.compartments(), 1));
    let y0 = FullState::from_values(layout, vec![10.0, 0.0]).unwrap();
    let mut sim = Simulation::new(SimulationMode::Ode)
        .model(model)
        .initial_state(y0)
        .time_grid(days(2))
        .solver(FixedStepSolver::rk4(2));
    assert!(matches!(
        sim.run(&mut RunContext::default()),
        Err(SimError::Model(ps_model::ModelError::UndefinedVariable { .. }))
    ));
}

#[test]
fn discrete_interventions_apply_after_each_step() {
    let (network, y0) = two_patch_sir();
    let vaccinate = MoveFraction::new("S", "R", 0.5)
        .unwrap()
        .during(1.0, 1.0)
        .for_patches(vec![0]);
    let mut sim = Simulation::new(SimulationMode::Discrete)
        .network(network)
        .initial_state(y0)
        .time_grid(days(3))
        .intervention(vaccinate);
    let mut ctx = RunContext::default();
    let run = sim.run(&mut ctx).unwrap();

    let s0 = run.series("S_0").unwrap();
    let s1 = run.series("S_1").unwrap();
    assert!(nearly_equal(s0[1], s1[1] / 2.0, Tolerances::default()));
    assert!(s0[2] < s0[1]);
    assert_eq!(ctx.stats().interventions_applied, 3);
}

#[test]
fn ode_interventions_integrate_piecewise() {
    let (network, y0) = two_patch_sir();
    let seed = SeedInfections::new(1, 3.0, 20.0).unwrap();
    let mut with_seed = Simulation::new(SimulationMode::Ode)
        .network(network.clone())
        .initial_state(y0.clone())
        .time_grid(days(5))
        .solver(FixedStepSolver::rk4(10))
        .intervention(seed);
    let mut plain = Simulation::new(SimulationMode::Ode)
        .network(network)
        .initial_state(y0)
        .time_grid(days(5))
        .solver(FixedStepSolver::rk4(10));

    let a = with_seed.run(&mut RunContext::default()).unwrap();
    let b = plain.run(&mut RunContext::default()).unwrap();
    let tol = Tolerances {
        abs: 1e-12,
        rel: 1e-12,
    };
    let ia = a.series("I_1").unwrap();
    let ib = b.series("I_1").unwrap();
    for k in 0..3 {
        assert!(nearly_equal(ia[k], ib[k], tol));
    }
    assert!(ia[3] > ib[3] + 19.0);
    assert_eq!(a.history.len(), 6);
}

#[test]
fn seeding_fires_again_on_a_second_run() {
    let (network, y0) = two_patch_sir();
    let seed = SeedInfections::new(0, 2.0, 10.0).unwrap();
    let mut sim = Simulation::new(SimulationMode::Discrete)
        .network(network)
        .initial_state(y0.clone())
        .time_grid(days(4))
        .intervention(seed);

    let first = sim.run(&mut RunContext::default()).unwrap();
    sim.set_state(y0);
    let mut ctx = RunContext::default();
    let second = sim.run(&mut ctx).unwrap();

    assert_eq!(first.series("I_0"), second.series("I_0"));
    assert!(second.series("I_0").unwrap()[2] > second.series("I_1").unwrap()[2] + 9.0);
    assert!(ctx.stats().interventions_applied > 0);
}

struct Failing;

impl Intervention for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn apply(&mut self, _state: &mut FullState, _t: f64) -> Result<(), InterventionError> {
        Err(InterventionError::InvalidCount { value: -1.0 })
    }
}

#[test]
fn intervention_failure_stops_the_list() {
    let (network, y0) = two_patch_sir();
    let mut sim = Simulation::new(SimulationMode::Discrete)
        .network(network)
        .time_grid(days(2))
        .intervention(MoveFraction::new("S", "R", 0.5).unwrap())
        .intervention(Failing)
        .intervention(MoveFraction::new("I", "R", 1.0).unwrap());

    let mut state = y0.clone();
    let err = sim.apply_interventions(&mut state, 0.0).unwrap_err();
    assert!(matches!(err, SimError::Intervention { ref name, .. } if name == "failing"));
    assert_eq!(state.get("S_0"), Some(49.5));
    assert_eq!(state.get("I_0"), Some(1.0));

    sim.set_state(y0);
    assert!(matches!(
        sim.run(&mut RunContext::default()),
        Err(SimError::Intervention { .. })
    ));
}

#[test]
fn registry_initializes_patches_from_seeds() {
    let registry = ModelRegistry::with_builtins();
    let seir = registry
        .create(
            "seir",
            &BTreeMap::from([
                ("beta".into(), 0.5),
                ("sigma".into(), 0.2),
                ("gamma".into(), 0.1),
            ]),
        )
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let seeds = [
        SeedRecord {
            region: "B".into(),
            date,
            count: 7.0,
        },
        SeedRecord {
            region: "A".into(),
            date,
            count: 5.0,
        },
        SeedRecord {
            region: "A".into(),
            date,
            count: 9.0,
        },
    ];
    let patch = PatchRecord {
        region: "A".into(),
        population: 100.0,
    };
    let state = seir.initialize(&patch, &seeds);
    assert_eq!(state.values(), vec![95.0, 0.0, 5.0, 0.0]);

    let tiny = PatchRecord {
        region: "B".into(),
        population: 3.0,
    };
    assert_eq!(seir.initialize(&tiny, &seeds).values(), vec![0.0, 0.0, 3.0, 0.0]);
}

proptest! {
    #[test]
    fn move_fraction_conserves_patch_totals(
        s0 in 0.0f64..1e4,
        s1 in 0.0f64..1e4,
        i0 in 0.0f64..1e3,
        fraction in 0.0f64..=1.0,
    ) {
        let layout = Arc::new(StateLayout::new(&["S".into(), "I".into(), "R".into()], 2));
        let mut state =
            FullState::from_values(layout, vec![s0, i0, 0.0, s1, 0.0, 0.0]).unwrap();
        let before = [state.patch_total(0), state.patch_total(1)];
        let mut vaccinate = MoveFraction::new("S", "R", fraction).unwrap();
        vaccinate.apply(&mut state, 0.0).unwrap();
        let tol = Tolerances { abs: 1e-9, rel: 1e-12 };
        prop_assert!(nearly_equal(state.patch_total(0), before[0], tol));
        prop_assert!(nearly_equal(state.patch_total(1), before[1], tol));
        prop_assert!(state.values().iter().all(|v| *v >= 0.0));
    }
}

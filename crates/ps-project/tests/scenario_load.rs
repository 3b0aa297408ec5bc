use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use ps_project::{
    InterventionDef, ModelDef, ProjectError, Scenario, ScenarioInputs, SolverDef, Source,
    ValidationError, load, load_yaml, read_seeds, save_yaml,
};
use ps_sim::SimulationMode;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ps_project_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

const SCENARIO: &str = r#"
version: 1
name: two-district-sir
mode: ode
model:
  kind: builtin
  name: sir
  parameters: { beta: 0.3, gamma: 0.1 }
solver: { method: dopri5, rtol: 1.0e-8 }
time: { start_date: 2024-01-01, days: 30 }
patches: { file: patches.csv }
network:
  edges: { file: network.csv }
  self_coupling: 1.0
seeds: { file: seeds.csv }
interventions:
  - { type: move_fraction, from: S, to: R, fraction: 0.01, start: 10, end: 20 }
"#;

fn write_inputs(dir: &std::path::Path) {
    fs::write(dir.join("patches.csv"), "region,population\nA,1000\nB,500\n").unwrap();
    fs::write(dir.join("network.csv"), "source,target,weight\nA,B,0.2\nB,A,0.1\n").unwrap();
    fs::write(
        dir.join("seeds.csv"),
        "region,date,seed_count\nA,2024-01-01,5\nB,2024-01-04,2\n",
    )
    .unwrap();
}

#[test]
fn loads_scenario_with_csv_inputs() {
    let dir = scratch("load");
    write_inputs(&dir);
    let path = dir.join("scenario.yaml");
    fs::write(&path, SCENARIO).unwrap();

    let scenario = load_yaml(&path).unwrap();
    assert_eq!(scenario.mode, SimulationMode::Ode);
    assert_eq!(scenario.model.name(), "sir");
    assert_eq!(
        scenario.solver,
        SolverDef::Dopri5 {
            rtol: 1e-8,
            atol: 1e-9
        }
    );
    assert_eq!(scenario.output.dir, dir.join("output"));
    assert_eq!(scenario.time.grid().len(), 31);

    let inputs = ScenarioInputs::load(&scenario).unwrap();
    let regions: Vec<&str> = inputs.regions().collect();
    assert_eq!(regions, vec!["A", "B"]);
    assert_eq!(inputs.edges[0].weight, 0.2);
    let start = scenario.time.start_date;
    assert_eq!(inputs.initial_seeds(start)[0].count, 5.0);
    assert_eq!(inputs.later_seeds(start), vec![(1, 3, 2.0)]);
}

#[test]
fn seed_reader_accepts_both_count_columns() {
    let dir = scratch("seeds");
    let path = dir.join("seeds.csv");
    fs::write(&path, "region,date,count\nA,2024-02-01,3\n").unwrap();
    let seeds = read_seeds(&path).unwrap();
    assert_eq!(seeds[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    assert_eq!(seeds[0].count, 3.0);

    fs::write(&path, "region,date,seed_count\nA,not-a-date,3\n").unwrap();
    assert!(matches!(read_seeds(&path), Err(ProjectError::Csv { .. })));
}

#[test]
fn inline_custom_model_round_trips() {
    let yaml = r#"
version: 1
name: inline
model:
  kind: custom
  compartments: [S, E, I, R]
  parameters: { beta: 0.5, sigma: 0.2, gamma: 0.1 }
  transitions:
    - { from: S, to: E, rate: "beta*S*lambda_i" }
    - { from: E, to: I, rate: "sigma*E" }
    - { from: I, to: R, rate: "gamma*I" }
time: { start_date: 2024-03-01, days: 10 }
patches:
  - { region: X, population: 100 }
seeds:
  - { region: X, date: 2024-03-01, count: 1 }
"#;
    let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(scenario.mode, SimulationMode::Discrete);
    assert_eq!(scenario.solver, SolverDef::default());
    match &scenario.model {
        ModelDef::Custom {
            transitions,
            infected,
            ..
        } => {
            assert_eq!(transitions.len(), 3);
            assert_eq!(infected, "I");
        }
        other => panic!("unexpected model {other:?}"),
    }
    assert!(matches!(scenario.network.edges, Source::Inline(ref e) if e.is_empty()));

    let dir = scratch("roundtrip");
    let path = dir.join("inline.yaml");
    save_yaml(&path, &scenario).unwrap();
    let reloaded = load(&path).unwrap();
    assert_eq!(reloaded.model, scenario.model);
    assert_eq!(reloaded.patches, scenario.patches);
}

fn base() -> Scenario {
    serde_yaml::from_str(
        r#"
version: 1
name: base
model: { kind: builtin, name: sir, parameters: { beta: 0.3, gamma: 0.1 } }
time: { start_date: 2024-01-01, days: 10 }
patches:
  - { region: A, population: 100 }
  - { region: B, population: 50 }
"#,
    )
    .unwrap()
}

#[test]
fn document_level_checks() {
    let mut s = base();
    s.time.days = 0;
    assert!(matches!(
        ps_project::validate_scenario(&s),
        Err(ValidationError::InvalidValue { .. })
    ));

    let mut s = base();
    s.version = 9;
    assert_eq!(
        ps_project::validate_scenario(&s),
        Err(ValidationError::UnsupportedVersion { version: 9 })
    );

    let mut s = base();
    s.interventions.push(InterventionDef::MoveFraction {
        from: "S".into(),
        to: "R".into(),
        fraction: 1.5,
        start: None,
        end: None,
        regions: None,
    });
    assert!(ps_project::validate_scenario(&s).is_err());

    let mut s = base();
    s.interventions.push(InterventionDef::MoveFraction {
        from: "S".into(),
        to: "R".into(),
        fraction: 0.5,
        start: Some(5.0),
        end: Some(2.0),
        regions: None,
    });
    assert!(ps_project::validate_scenario(&s).is_err());
}

#[test]
fn cross_record_checks() {
    let mut s = base();
    s.network.edges = Source::Inline(vec![ps_core::EdgeRecord {
        source: "A".into(),
        target: "Z".into(),
        weight: 1.0,
    }]);
    assert!(matches!(
        ScenarioInputs::load(&s),
        Err(ProjectError::Validation(ValidationError::MissingReference { .. }))
    ));

    let mut s = base();
    s.seeds = Source::Inline(vec![ps_core::SeedRecord {
        region: "B".into(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        count: 51.0,
    }]);
    assert!(ScenarioInputs::load(&s).is_err());

    let mut s = base();
    s.patches = Source::Inline(vec![
        ps_core::PatchRecord {
            region: "A".into(),
            population: 1.0,
        },
        ps_core::PatchRecord {
            region: "A".into(),
            population: 2.0,
        },
    ]);
    assert!(matches!(
        ScenarioInputs::load(&s),
        Err(ProjectError::Validation(ValidationError::DuplicateId { .. }))
    ));

    // Out-of-period seeds only warn.
    let mut s = base();
    s.seeds = Source::Inline(vec![ps_core::SeedRecord {
        region: "A".into(),
        date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        count: 1.0,
    }]);
    assert!(ScenarioInputs::load(&s).is_ok());
}

#[test]
fn unknown_extension_is_rejected() {
    assert!(matches!(
        load(std::path::Path::new("scenario.toml")),
        Err(ProjectError::UnsupportedFormat { .. })
    ));
}

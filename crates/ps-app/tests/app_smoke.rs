use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ps_app::*;
use ps_core::{Tolerances, nearly_equal};
use ps_sim::ModelRegistry;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_scenario(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("scenario.yaml");
    fs::write(&path, body).expect("failed to write scenario");
    path
}

const TWO_DISTRICTS: &str = r#"
version: 1
name: two-district-sir
mode: discrete
model:
  kind: builtin
  name: sir
  parameters: { beta: 0.3, gamma: 0.1 }
time: { start_date: 2024-01-01, days: 60 }
patches:
  - { region: A, population: 100 }
  - { region: B, population: 100 }
network:
  self_coupling: 1.0
seeds:
  - { region: A, date: 2024-01-01, count: 1 }
  - { region: B, date: 2024-01-01, count: 1 }
"#;

fn tol() -> Tolerances {
    Tolerances {
        abs: 1e-9,
        rel: 1e-9,
    }
}

#[test]
fn compiled_scenario_reproduces_first_step() {
    let dir = unique_temp_dir("ps_app_first_step");
    let path = write_scenario(&dir, TWO_DISTRICTS);

    let scenario = load_scenario(&path).unwrap();
    let compiled = compile_scenario(scenario, &ModelRegistry::with_builtins()).unwrap();
    assert_eq!(compiled.regions(), ["A".to_string(), "B".to_string()]);
    assert_eq!(compiled.initial.get("S_0"), Some(99.0));
    assert_eq!(compiled.initial.get("I_1"), Some(1.0));

    let mut simulation = compiled.simulation().unwrap();
    let trajectory = simulation
        .run(&mut ps_core::RunContext::new("first-step"))
        .unwrap();
    for key in ["I_0", "I_1"] {
        let series = trajectory.series(key).unwrap();
        assert!(nearly_equal(series[1], 1.197, tol()), "{key}: {}", series[1]);
    }

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn validate_reports_counts() {
    let dir = unique_temp_dir("ps_app_validate");
    let path = write_scenario(&dir, TWO_DISTRICTS);
    let summary = validate_scenario_file(&path).unwrap();
    assert_eq!(summary.name, "two-district-sir");
    assert_eq!(summary.patches, 2);
    assert_eq!(summary.seeds, 2);
    assert_eq!(summary.days, 60);
    assert!(!summary.custom_model);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unknown_builtin_model_is_reported() {
    let dir = unique_temp_dir("ps_app_unknown_model");
    let path = write_scenario(&dir, &TWO_DISTRICTS.replace("name: sir", "name: seirs"));
    let scenario = load_scenario(&path).unwrap();
    let err = compile_scenario(scenario, &ModelRegistry::with_builtins())
        .err()
        .expect("expected unknown model");
    assert!(matches!(err, AppError::Simulation(ref m) if m.contains("seirs")));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn later_seed_fires_on_its_day() {
    let body = r#"
version: 1
name: late-seed
model:
  kind: builtin
  name: sir
  parameters: { beta: 0.0, gamma: 0.0 }
time: { start_date: 2024-01-01, days: 5 }
patches:
  - { region: A, population: 100 }
network:
  self_coupling: 1.0
seeds:
  - { region: A, date: 2024-01-03, count: 4 }
"#;
    let dir = unique_temp_dir("ps_app_late_seed");
    let path = write_scenario(&dir, body);
    let compiled = compile_scenario(load_scenario(&path).unwrap(), &ModelRegistry::with_builtins())
        .unwrap();
    assert_eq!(compiled.initial.get("I_0"), Some(0.0));

    let trajectory = compiled
        .simulation()
        .unwrap()
        .run(&mut ps_core::RunContext::new("late"))
        .unwrap();
    let infected = trajectory.series("I_0").unwrap();
    assert_eq!(&infected[..2], &[0.0, 0.0]);
    assert_eq!(infected[2], 4.0);
    assert_eq!(infected[5], 4.0);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn custom_model_with_regional_intervention() {
    let body = r#"
version: 1
name: custom-si
model:
  kind: custom
  name: si
  compartments: [S, I, V]
  parameters: { beta: 0.0 }
  transitions:
    - { from: S, to: I, rate: "beta*S*lambda_i" }
time: { start_date: 2024-01-01, days: 3 }
patches:
  - { region: A, population: 100 }
  - { region: B, population: 100 }
network:
  self_coupling: 1.0
interventions:
  - { type: move_fraction, from: S, to: V, fraction: 0.5, start: 1, end: 1, regions: [B] }
"#;
    let dir = unique_temp_dir("ps_app_custom");
    let path = write_scenario(&dir, body);
    let compiled = compile_scenario(load_scenario(&path).unwrap(), &ModelRegistry::with_builtins())
        .unwrap();
    let trajectory = compiled
        .simulation()
        .unwrap()
        .run(&mut ps_core::RunContext::new("custom"))
        .unwrap();
    assert_eq!(trajectory.series("V_0").unwrap()[3], 0.0);
    assert_eq!(trajectory.series("V_1").unwrap()[1], 50.0);
    assert_eq!(trajectory.series("V_1").unwrap()[3], 50.0);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn ensure_run_saves_then_hits_cache() {
    let dir = unique_temp_dir("ps_app_run_cache");
    let path = write_scenario(&dir, TWO_DISTRICTS);

    let request = RunRequest {
        scenario_path: &path,
        options: RunOptions::default(),
    };
    let first = ensure_run(&request).unwrap();
    assert!(!first.loaded_from_cache);
    assert!(first.run_dir.join("manifest.json").exists());
    assert!(first.run_dir.join("history.csv").exists());
    assert_eq!(first.manifest.summary.steps, 60);
    let outbreak = first.outbreak.unwrap();
    assert!(outbreak.peak_infected > 2.0);
    assert!(outbreak.final_recovered > 0.0);

    let second = ensure_run(&request).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);

    let runs = list_runs(&path).unwrap();
    assert_eq!(runs.len(), 1);

    let (manifest, rows) = load_run(&path, &first.run_id).unwrap();
    assert_eq!(manifest.compartments, vec!["S", "I", "R"]);
    assert_eq!(rows.len(), 61 * 2);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn loading_unknown_run_is_not_found() {
    let dir = unique_temp_dir("ps_app_missing_run");
    let path = write_scenario(&dir, TWO_DISTRICTS);
    assert!(matches!(
        load_run(&path, "does-not-exist"),
        Err(AppError::RunNotFound(_))
    ));
    let _ = fs::remove_dir_all(dir);
}

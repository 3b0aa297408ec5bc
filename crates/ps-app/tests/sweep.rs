use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use ps_app::*;
use ps_sim::ModelRegistry;

const SCENARIO: &str = r#"
version: 1
name: sweep-sir
mode: ode
model:
  kind: builtin
  name: sir
  parameters: { beta: 0.3, gamma: 0.1 }
solver: { method: rk4, substeps: 4 }
time: { start_date: 2024-01-01, days: 120 }
patches:
  - { region: A, population: 1000 }
  - { region: B, population: 500 }
network:
  edges:
    - { source: A, target: B, weight: 0.1 }
    - { source: B, target: A, weight: 0.1 }
  self_coupling: 1.0
seeds:
  - { region: A, date: 2024-01-01, count: 5 }
"#;

fn compiled() -> CompiledScenario {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("ps_app_sweep_{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("scenario.yaml");
    fs::write(&path, SCENARIO).unwrap();
    let scenario = load_scenario(&path).unwrap();
    let compiled = compile_scenario(scenario, &ModelRegistry::with_builtins()).unwrap();
    let _ = fs::remove_dir_all(dir);
    compiled
}

#[test]
fn sweep_preserves_order_and_grows_with_beta() {
    let compiled = compiled();
    let values = [0.15, 0.3, 0.6];
    let points = run_sweep(&compiled, "beta", &values).unwrap();

    assert_eq!(points.len(), 3);
    for (point, value) in points.iter().zip(values) {
        assert_eq!(point.value, value);
        assert!(point.summary.peak_infected >= 5.0);
        assert!(point.summary.peak_day >= 0.0 && point.summary.peak_day <= 120.0);
    }
    assert!(points[2].summary.peak_infected > points[1].summary.peak_infected);
    assert!(points[1].summary.peak_infected > points[0].summary.peak_infected);
    assert!(points[2].summary.final_recovered > points[0].summary.final_recovered);
}

#[test]
fn sweep_matches_single_run() {
    let compiled = compiled();
    let points = run_sweep(&compiled, "beta", &[0.3]).unwrap();
    let trajectory = compiled
        .simulation()
        .unwrap()
        .run(&mut ps_core::RunContext::new("single"))
        .unwrap();
    let single = summarize_outbreak(&trajectory, "I", "R").unwrap();
    assert_eq!(points[0].summary, single);
}

#[test]
fn sweep_rejects_unknown_parameter() {
    let compiled = compiled();
    assert!(matches!(
        run_sweep(&compiled, "delta", &[1.0]),
        Err(AppError::InvalidInput(_))
    ));
}

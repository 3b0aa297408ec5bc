use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use ps_app::*;
use ps_waning::RevaccinationStrategy;

const PARAMS: &str = r#"
beta: 0.3
gamma: 0.1
vax_rate: 0.02
weibull_shape_vax: 2.0
weibull_scale_vax: 60.0
weibull_shape_rec: 1.5
weibull_scale_rec: 90.0
days: 90
seed_rate: 0.0
vax_period: 30
vax_duration: 5
start_vax_day: 10
S0: 950
I0: 50
"#;

#[test]
fn waning_run_writes_csv() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("ps_app_waning_{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    let params_path = dir.join("waning.yaml");
    fs::write(&params_path, PARAMS).unwrap();

    let request = WaningRequest {
        params_path,
        strategy: RevaccinationStrategy::Targeted,
        seed: 42,
        output: Some(dir.join("out").join("waning.csv")),
    };
    let trajectory = run_waning(&request).unwrap();
    assert_eq!(trajectory.len(), 90);
    assert_eq!(trajectory.diagnostics.rounds, 3);

    let csv = fs::read_to_string(dir.join("out").join("waning.csv")).unwrap();
    assert_eq!(csv.lines().count(), 91);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_params_file_is_a_read_error() {
    let request = WaningRequest {
        params_path: std::env::temp_dir().join("ps_app_no_such_params.yaml"),
        strategy: RevaccinationStrategy::Random,
        seed: 1,
        output: None,
    };
    assert!(matches!(run_waning(&request), Err(AppError::FileRead { .. })));
}

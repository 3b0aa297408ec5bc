use ps_core::{RunContext, Tolerances, nearly_equal};
use ps_waning::{RevaccinationStrategy, WaningModel, WaningParams};

fn params() -> WaningParams {
    WaningParams {
        beta: 0.3,
        gamma: 0.1,
        vax_rate: 0.02,
        weibull_shape_vax: 2.0,
        weibull_scale_vax: 60.0,
        weibull_shape_rec: 1.5,
        weibull_scale_rec: 90.0,
        days: 200,
        seed_rate: 0.0,
        vax_period: 30,
        vax_duration: 5,
        start_vax_day: 10,
        s0: 900.0,
        i0: 20.0,
        r0: 30.0,
        v0: 50.0,
    }
}

fn run(strategy: RevaccinationStrategy, seed: u64) -> ps_waning::WaningTrajectory {
    let model = WaningModel::new(params())
        .unwrap()
        .with_strategy(strategy)
        .with_seed(seed);
    let mut ctx = RunContext::new("waning-test");
    model.run(&mut ctx).unwrap()
}

#[test]
fn population_is_conserved_under_fixed_seed() {
    let tol = Tolerances {
        abs: 1e-8,
        rel: 1e-9,
    };
    for strategy in [RevaccinationStrategy::Random, RevaccinationStrategy::Targeted] {
        let traj = run(strategy, 42);
        assert_eq!(traj.len(), 200);
        for day in 0..traj.len() {
            assert!(
                nearly_equal(traj.total(day), 1000.0, tol),
                "day {day}: total {}",
                traj.total(day)
            );
        }
        assert_eq!(traj.diagnostics.conservation_violations, 0);
    }
}

#[test]
fn same_seed_reproduces_run() {
    let a = run(RevaccinationStrategy::Random, 11);
    let b = run(RevaccinationStrategy::Random, 11);
    assert_eq!(a, b);
}

#[test]
fn vaccination_rounds_follow_period() {
    let traj = run(RevaccinationStrategy::Targeted, 3);
    // Rounds start on days 10, 40, ..., 190.
    assert_eq!(traj.diagnostics.rounds, 7);
    // No vaccination before the first round.
    for day in 1..10 {
        assert!(traj.v[day] <= traj.v[day - 1]);
    }
}

#[test]
fn without_vaccination_v_only_wanes() {
    let mut p = params();
    p.vax_rate = 0.0;
    let model = WaningModel::new(p).unwrap().with_seed(5);
    let traj = model.run(&mut RunContext::new("no-vax")).unwrap();
    for day in 1..traj.len() {
        assert!(traj.v[day] <= traj.v[day - 1]);
    }
    assert_eq!(traj.diagnostics.revaccinated, 0);
}

#[test]
fn step_counter_matches_days() {
    let model = WaningModel::new(params()).unwrap();
    let mut ctx = RunContext::new("steps");
    model.run(&mut ctx).unwrap();
    assert_eq!(ctx.stats().steps, 199);
}

#[test]
fn csv_output_has_header_and_one_row_per_day() {
    let traj = run(RevaccinationStrategy::Random, 1);
    let mut buf = Vec::new();
    traj.write_csv(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("day,S,I,R,V"));
    assert_eq!(lines.count(), 200);
}

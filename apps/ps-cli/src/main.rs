use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ps_app::{AppError, AppResult, RunOptions, RunRequest};
use ps_sim::ModelRegistry;
use ps_waning::RevaccinationStrategy;
use tracing::Level;

#[derive(Parser)]
#[command(name = "patchsim")]
#[command(about = "patchsim - metapopulation epidemic simulation", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario and the files it references
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// List built-in disease models
    Models,
    /// Run a scenario and store its results
    Run {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs of a scenario
    Runs {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Run a scenario for several values of one parameter in parallel
    Sweep {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
        /// Model parameter to vary
        #[arg(short, long)]
        param: String,
        /// Comma-separated parameter values
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,
    },
    /// Run the stochastic SIRSV waning model
    Waning {
        /// Path to the parameter YAML file
        params_path: PathBuf,
        /// Re-vaccination strategy: random or targeted
        #[arg(long, default_value = "random")]
        strategy: String,
        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Output CSV file path (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Models => cmd_models(),
        Commands::Run {
            scenario_path,
            no_cache,
        } => cmd_run(&scenario_path, !no_cache),
        Commands::Runs { scenario_path } => cmd_runs(&scenario_path),
        Commands::Sweep {
            scenario_path,
            param,
            values,
        } => cmd_sweep(&scenario_path, &param, &values),
        Commands::Waning {
            params_path,
            strategy,
            seed,
            output,
        } => cmd_waning(params_path, &strategy, seed, output),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let summary = ps_app::validate_scenario_file(scenario_path)?;
    println!("✓ Scenario is valid");
    println!("  Name: {}", summary.name);
    println!(
        "  Model: {}{} ({} mode)",
        summary.model,
        if summary.custom_model { " (custom)" } else { "" },
        summary.mode
    );
    println!(
        "  Patches: {}, edges: {}, seeds: {}, interventions: {}",
        summary.patches, summary.edges, summary.seeds, summary.interventions
    );
    println!("  Days: {}", summary.days);
    Ok(())
}

fn cmd_models() -> AppResult<()> {
    let registry = ModelRegistry::with_builtins();
    println!("Built-in models:");
    for name in ps_app::list_models(&registry) {
        println!("  {}", name);
    }
    Ok(())
}

fn cmd_run(scenario_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running scenario: {}", scenario_path.display());

    let request = RunRequest {
        scenario_path,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };
    let response = ps_app::ensure_run(&request)?;

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }

    let manifest = &response.manifest;
    println!("  Results: {}", response.run_dir.display());
    println!(
        "  Model: {} ({} mode), {} patches, {} days",
        manifest.model,
        manifest.mode,
        manifest.regions.len(),
        manifest.days
    );
    println!(
        "  Steps: {}, rhs evaluations: {}, clamped values: {}, interventions: {}",
        manifest.summary.steps,
        manifest.summary.rhs_evaluations,
        manifest.summary.clamped_values,
        manifest.summary.interventions_applied
    );
    if let Some(outbreak) = response.outbreak {
        println!(
            "  Peak infected: {:.2} on day {}",
            outbreak.peak_infected, outbreak.peak_day
        );
        println!("  Final recovered: {:.2}", outbreak.final_recovered);
    }
    println!("  Elapsed: {:.3}s", response.elapsed_s);
    Ok(())
}

fn cmd_runs(scenario_path: &Path) -> AppResult<()> {
    let runs = ps_app::list_runs(scenario_path)?;

    if runs.is_empty() {
        println!("No stored runs for scenario: {}", scenario_path.display());
    } else {
        println!("Stored runs:");
        for manifest in runs {
            println!(
                "  {} - {} ({}, {})",
                manifest.run_id, manifest.timestamp, manifest.model, manifest.mode
            );
        }
    }
    Ok(())
}

fn cmd_sweep(scenario_path: &Path, param: &str, values: &[f64]) -> AppResult<()> {
    if values.is_empty() {
        return Err(AppError::InvalidInput("no sweep values given".to_string()));
    }
    let scenario = ps_app::load_scenario(scenario_path)?;
    let compiled = ps_app::compile_scenario(scenario, &ModelRegistry::with_builtins())?;
    println!(
        "Sweeping {} over {} values ({} patches)",
        param,
        values.len(),
        compiled.regions().len()
    );

    let points = ps_app::run_sweep(&compiled, param, values)?;
    println!(
        "{:>12}  {:>14}  {:>9}  {:>16}",
        param, "peak_infected", "peak_day", "final_recovered"
    );
    for point in points {
        println!(
            "{:>12}  {:>14.3}  {:>9}  {:>16.3}",
            point.value,
            point.summary.peak_infected,
            point.summary.peak_day,
            point.summary.final_recovered
        );
    }
    Ok(())
}

fn cmd_waning(
    params_path: PathBuf,
    strategy: &str,
    seed: u64,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let strategy: RevaccinationStrategy = strategy.parse()?;
    let request = ps_app::WaningRequest {
        params_path,
        strategy,
        seed,
        output,
    };
    let trajectory = ps_app::run_waning(&request)?;

    let last = trajectory.len() - 1;
    let (peak, peak_day) = trajectory.peak_infected();
    println!("✓ Waning simulation completed ({} strategy, seed {})", strategy, seed);
    println!(
        "  Day {}: S={:.2}, I={:.2}, R={:.2}, V={:.2}",
        last, trajectory.s[last], trajectory.i[last], trajectory.r[last], trajectory.v[last]
    );
    println!("  Peak infected: {:.2} on day {}", peak, peak_day);
    let d = &trajectory.diagnostics;
    println!(
        "  Rounds: {}, re-vaccinated: {}, warnings: {} conservation, {} negative, {} length",
        d.rounds, d.revaccinated, d.conservation_violations, d.negative_days, d.length_discrepancies
    );
    if let Some(path) = &request.output {
        println!("  Written: {}", path.display());
    }
    Ok(())
}

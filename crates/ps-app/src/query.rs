//! Query helpers over finished trajectories.

use ps_network::Trajectory;

use crate::error::{AppError, AppResult};

/// Headline numbers of one run, summed over patches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutbreakSummary {
    pub peak_infected: f64,
    pub peak_day: f64,
    pub final_recovered: f64,
}

/// Sum of one compartment over all patches at every time point.
pub fn compartment_totals(trajectory: &Trajectory, compartment: &str) -> AppResult<Vec<f64>> {
    trajectory
        .history
        .compartment_total(compartment)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown compartment: {}", compartment)))
}

/// `R` when the model has one, otherwise the last compartment.
pub fn recovered_compartment(compartments: &[String]) -> Option<&str> {
    compartments
        .iter()
        .find(|c| c.as_str() == "R")
        .or_else(|| compartments.last())
        .map(String::as_str)
}

pub fn summarize_outbreak(
    trajectory: &Trajectory,
    infected: &str,
    recovered: &str,
) -> AppResult<OutbreakSummary> {
    let infected = compartment_totals(trajectory, infected)?;
    let recovered = compartment_totals(trajectory, recovered)?;
    if infected.is_empty() {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    }

    let (peak_index, peak_infected) = infected
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (k, v)| {
            if v > best.1 { (k, v) } else { best }
        });

    Ok(OutbreakSummary {
        peak_infected,
        peak_day: trajectory.times[peak_index],
        final_recovered: recovered.last().copied().unwrap_or(0.0),
    })
}

//! Scenario validation logic.

use std::collections::HashSet;

use ps_core::{EdgeRecord, PatchRecord, SeedRecord};
use tracing::warn;

use crate::schema::{InterventionDef, ModelDef, Scenario, SolverDef};
use crate::LATEST_VERSION;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Checks that need only the scenario document itself.
pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }
    if scenario.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }
    if scenario.time.days == 0 {
        return Err(invalid("time.days", 0, "must be positive"));
    }

    if let ModelDef::Custom {
        compartments,
        infected,
        ..
    } = &scenario.model
    {
        let mut seen = HashSet::new();
        for c in compartments {
            if !seen.insert(c) {
                return Err(ValidationError::DuplicateId {
                    id: c.clone(),
                    context: "model.compartments".to_string(),
                });
            }
        }
        if !compartments.contains(infected) {
            return Err(ValidationError::MissingReference {
                id: infected.clone(),
                context: "model.infected".to_string(),
            });
        }
    }
    for (name, value) in scenario.model.parameters() {
        if !value.is_finite() {
            return Err(invalid(&format!("model.parameters.{name}"), value, "must be finite"));
        }
    }

    match &scenario.solver {
        SolverDef::Rk4 { substeps } | SolverDef::Euler { substeps } if *substeps == 0 => {
            return Err(invalid("solver.substeps", substeps, "must be positive"));
        }
        SolverDef::Dopri5 { rtol, atol } => {
            if !(*rtol > 0.0) {
                return Err(invalid("solver.rtol", rtol, "must be positive"));
            }
            if !(*atol >= 0.0) {
                return Err(invalid("solver.atol", atol, "must be non-negative"));
            }
        }
        _ => {}
    }

    if let Some(w) = scenario.network.self_coupling {
        if !w.is_finite() || w < 0.0 {
            return Err(invalid("network.self_coupling", w, "must be finite and non-negative"));
        }
    }

    for (i, intervention) in scenario.interventions.iter().enumerate() {
        match intervention {
            InterventionDef::MoveFraction {
                fraction,
                start,
                end,
                ..
            } => {
                if !(0.0..=1.0).contains(fraction) {
                    return Err(invalid(
                        &format!("interventions[{i}].fraction"),
                        fraction,
                        "must lie in [0, 1]",
                    ));
                }
                if let (Some(start), Some(end)) = (start, end) {
                    if end < start {
                        return Err(invalid(
                            &format!("interventions[{i}].end"),
                            end,
                            "must not precede start",
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Checks across the loaded patch, edge and seed records.
pub fn validate_inputs(
    scenario: &Scenario,
    patches: &[PatchRecord],
    edges: &[EdgeRecord],
    seeds: &[SeedRecord],
) -> Result<(), ValidationError> {
    if patches.is_empty() {
        return Err(invalid("patches", 0, "at least one patch is required"));
    }
    let mut regions = HashSet::new();
    for patch in patches {
        if !regions.insert(patch.region.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: patch.region.clone(),
                context: "patches".to_string(),
            });
        }
        if !(patch.population > 0.0 && patch.population.is_finite()) {
            return Err(invalid(
                &format!("patches.{}.population", patch.region),
                patch.population,
                "must be positive",
            ));
        }
    }

    for edge in edges {
        for region in [&edge.source, &edge.target] {
            if !regions.contains(region.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: region.clone(),
                    context: "network edges".to_string(),
                });
            }
        }
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            return Err(invalid(
                &format!("network.{}->{}.weight", edge.source, edge.target),
                edge.weight,
                "must be finite and non-negative",
            ));
        }
    }

    let end = scenario.time.end_date();
    for seed in seeds {
        let Some(patch) = patches.iter().find(|p| p.region == seed.region) else {
            return Err(ValidationError::MissingReference {
                id: seed.region.clone(),
                context: "seeds".to_string(),
            });
        };
        if !(seed.count >= 0.0 && seed.count <= patch.population) {
            return Err(invalid(
                &format!("seeds.{}.count", seed.region),
                seed.count,
                "must lie between zero and the patch population",
            ));
        }
        if seed.date < scenario.time.start_date || seed.date > end {
            warn!(
                region = %seed.region,
                date = %seed.date,
                "seed date outside the simulated period"
            );
        }
    }

    for intervention in &scenario.interventions {
        match intervention {
            InterventionDef::MoveFraction {
                regions: targets, ..
            } => {
                for region in targets.iter().flatten() {
                    if !regions.contains(region.as_str()) {
                        return Err(ValidationError::MissingReference {
                            id: region.clone(),
                            context: "interventions".to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

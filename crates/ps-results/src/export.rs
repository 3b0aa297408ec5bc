//! History CSV layout: `region, day, <compartment>...`, one row per region
//! and time point.

use std::io::{Read, Write};

use ps_network::Trajectory;

use crate::types::HistoryRow;
use crate::{ResultsError, ResultsResult};

/// Flatten a trajectory into region rows; `regions[p]` names patch `p`.
pub fn history_rows(trajectory: &Trajectory, regions: &[String]) -> Vec<HistoryRow> {
    let history = &trajectory.history;
    let layout = history.layout();
    let mut rows = Vec::with_capacity(history.len() * layout.num_patches());
    for (k, &day) in trajectory.times.iter().enumerate() {
        for patch in 0..layout.num_patches() {
            let region = regions
                .get(patch)
                .cloned()
                .unwrap_or_else(|| patch.to_string());
            let values = (0..layout.num_compartments())
                .map(|c| history.column(layout.position(patch, c))[k])
                .collect();
            rows.push(HistoryRow { region, day, values });
        }
    }
    rows
}

pub fn write_history_csv<W: Write>(
    writer: W,
    compartments: &[String],
    rows: &[HistoryRow],
) -> ResultsResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["region".to_string(), "day".to_string()];
    header.extend(compartments.iter().cloned());
    csv.write_record(&header)?;
    for row in rows {
        let mut record = Vec::with_capacity(row.values.len() + 2);
        record.push(row.region.clone());
        record.push(row.day.to_string());
        record.extend(row.values.iter().map(|v| v.to_string()));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Read rows back; returns the compartment header and the rows.
pub fn read_history_csv<R: Read>(reader: R) -> ResultsResult<(Vec<String>, Vec<HistoryRow>)> {
    let mut csv = csv::Reader::from_reader(reader);
    let header = csv.headers()?.clone();
    if header.len() < 2 || &header[0] != "region" || &header[1] != "day" {
        return Err(ResultsError::MalformedHistory {
            message: "expected `region,day` leading columns".to_string(),
        });
    }
    let compartments: Vec<String> = header.iter().skip(2).map(str::to_string).collect();

    let parse = |field: &str| {
        field
            .parse::<f64>()
            .map_err(|e| ResultsError::MalformedHistory {
                message: format!("`{field}`: {e}"),
            })
    };
    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let values = record
            .iter()
            .skip(2)
            .map(parse)
            .collect::<ResultsResult<Vec<_>>>()?;
        rows.push(HistoryRow {
            region: record[0].to_string(),
            day: parse(&record[1])?,
            values,
        });
    }
    Ok((compartments, rows))
}

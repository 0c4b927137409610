//! CSV export of batch-run summaries.
//!
//! One record per run: the run number and the mean patient time in
//! system for that run. The header matches the historical results file
//! (`Run,Length of stay`) so downstream pandas/matplotlib analysis keeps
//! working unchanged.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "Run")]
    pub run: usize,
    #[serde(rename = "Length of stay")]
    pub mean_time_in_system: f64,
}

/// Writes all records to `path`, overwriting any previous batch.
pub fn write_batch_results(path: &Path, records: &[RunRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a batch file back, e.g. to summarize a finished experiment.
pub fn read_batch_results(path: &Path) -> Result<Vec<RunRecord>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize().collect()
}

/// Mean of the per-run means, `None` for an empty batch.
pub fn mean_of_runs(records: &[RunRecord]) -> Option<f64> {
    if records.is_empty() {
        None
    } else {
        Some(records.iter().map(|r| r.mean_time_in_system).sum::<f64>() / records.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn header_matches_the_results_file_format() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(RunRecord {
                run: 0,
                mean_time_in_system: 24.5,
            })
            .unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Run,Length of stay\n"));
    }

    #[test]
    fn mean_of_runs_averages_per_run_means() {
        assert_eq!(mean_of_runs(&[]), None);
        let records = vec![
            RunRecord {
                run: 0,
                mean_time_in_system: 10.0,
            },
            RunRecord {
                run: 1,
                mean_time_in_system: 20.0,
            },
        ];
        assert_relative_eq!(mean_of_runs(&records).unwrap(), 15.0);
    }
}

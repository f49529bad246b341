//! CSV artifacts: per-anomaly detail tables and the run summary.
//!
//! Writer failures are caught and logged per artifact; one artifact failing
//! never blocks the others.

use std::path::PathBuf;

use log::warn;

use crate::config::Config;
use crate::error::DetectError;
use crate::evaluator::Outcome;
use crate::pipeline::RunLog;
use crate::table::Table;

pub const SUMMARY_FILENAME: &str = "anomaly_summary.csv";

/// Write every detail table that was produced. Returns the paths written.
pub fn write_detail_tables(
    config: &Config,
    outcomes: &[Outcome],
    log: &mut RunLog,
) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for outcome in outcomes {
        let result = outcome.result();
        let (Some(filename), Some(detail)) = (result.kind.detail_filename(), &result.detail)
        else {
            continue;
        };

        let path = config.output_path(filename);
        match detail.write_csv(&path) {
            Ok(()) => {
                log.push(format!("Saved {} ({} rows).", filename, detail.len()));
                written.push(path);
            }
            Err(e) => {
                let err = DetectError::SerializationFailure {
                    artifact: filename.to_string(),
                    message: format!("{e:#}"),
                };
                warn!("{err}");
                log.push(err.to_string());
            }
        }
    }

    written
}

/// Build the summary table (`Anomaly_Type,Count`) from the six definitions
/// that contribute scalar counts, in catalog order.
pub fn build_summary(outcomes: &[Outcome]) -> Table {
    let mut summary = Table::new(vec!["Anomaly_Type", "Count"]);
    for outcome in outcomes {
        let result = outcome.result();
        if result.kind.in_summary() {
            summary.push_row(vec![
                Some(result.kind.label().to_string()),
                Some(result.count.to_string()),
            ]);
        }
    }
    summary
}

/// Write the summary table. Returns the path on success; a failure is logged
/// and reported to the caller so the history step can be skipped.
pub fn write_summary(config: &Config, summary: &Table, log: &mut RunLog) -> Option<PathBuf> {
    let path = config.output_path(SUMMARY_FILENAME);
    match summary.write_csv(&path) {
        Ok(()) => {
            log.push(format!("Saved {} ({} rows).", SUMMARY_FILENAME, summary.len()));
            Some(path)
        }
        Err(e) => {
            let err = DetectError::SerializationFailure {
                artifact: SUMMARY_FILENAME.to_string(),
                message: format!("{e:#}"),
            };
            warn!("{err}");
            log.push(err.to_string());
            None
        }
    }
}

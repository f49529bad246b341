//! End-to-end detection run.
//!
//! Sequential, single-threaded: resolve configuration, evaluate the catalog,
//! write report artifacts, append the validation history. Every partial
//! failure ends up in the returned narrative; only an unusable output
//! directory aborts the run.

use chrono::Utc;
use log::warn;

use crate::catalog::AnomalyKind;
use crate::config::Config;
use crate::error::DetectError;
use crate::history::{HistoryLog, RunStamp, HISTORY_FILENAME};
use crate::report::charts::render_all;
use crate::report::{build_summary, write_detail_tables, write_summary};
use crate::table::Table;

/// Accumulates the human-readable run narrative, line by line.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_report(self) -> String {
        self.lines.join("\n")
    }
}

/// Run the full pipeline and return the multi-line status report.
///
/// Fails only with [`DetectError::StorageUnavailable`]; every other failure
/// is degraded and reported in the narrative.
pub fn run(config: &Config) -> Result<String, DetectError> {
    config.ensure_output_dir()?;

    let mut log = RunLog::new();
    log.push(format!(
        "Report run at (UTC): {}",
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    ));
    log.push(format!("Outputs directory: {}", config.output_dir.display()));
    log.push("");

    // Evaluate the catalog, relational first, flat files on failure
    let outcomes = crate::evaluator::evaluate_catalog(config, &mut log);
    log.push("");

    // Persist detail tables and the summary
    let mut written = write_detail_tables(config, &outcomes, &mut log);
    let summary = build_summary(&outcomes);
    let summary_path = write_summary(config, &summary, &mut log);
    if let Some(path) = &summary_path {
        written.push(path.clone());
    }

    // Charts come from the in-memory tables, never from re-querying
    let top_airlines = outcomes
        .iter()
        .find(|o| o.result().kind == AnomalyKind::AirlineRank)
        .and_then(|o| o.result().detail.as_ref());
    written.extend(render_all(config, &summary, top_airlines, &mut log));

    // Append to validation history from the just-written summary
    match &summary_path {
        Some(path) => match Table::read_csv(path) {
            Ok(loaded) => {
                let history = HistoryLog::new(config.output_path(HISTORY_FILENAME));
                let stamp = RunStamp::now();
                match history.append(&loaded, &stamp, &mut log) {
                    Ok(total) => log.push(format!(
                        "Validation history updated ({}, run {}), {} rows total.",
                        stamp.timestamp, stamp.run_id, total
                    )),
                    Err(e) => {
                        warn!("{e}");
                        log.push(e.to_string());
                    }
                }
            }
            Err(e) => log.push(format!(
                "Could not reload summary for history logging: {e:#}"
            )),
        },
        None => log.push("Summary unavailable, validation history not updated.".to_string()),
    }

    // Narrative tail: artifacts and counts
    log.push("");
    log.push("Saved files:");
    for path in &written {
        log.push(format!("  - {}", path.display()));
    }
    log.push("");
    log.push("Summary counts:");
    for outcome in &outcomes {
        let result = outcome.result();
        if !result.kind.in_summary() {
            continue;
        }
        match outcome.reason() {
            None => log.push(format!("  - {}: {}", result.kind, result.count)),
            Some(reason) => log.push(format!(
                "  - {}: {} (degraded: {})",
                result.kind, result.count, reason
            )),
        }
    }

    Ok(log.into_report())
}

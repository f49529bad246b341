//! Append-only validation history.
//!
//! Each run's summary rows are stamped with a local display timestamp and a
//! UTC-based, second-precision, lexically sortable run identifier, then
//! appended after any existing history rows. Existing rows are never
//! rewritten. Every invocation is a new observation: appending the same
//! summary twice yields two entries with distinct run identifiers.

use chrono::{Local, Utc};
use log::warn;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::DetectError;
use crate::pipeline::RunLog;
use crate::table::Table;

pub const HISTORY_FILENAME: &str = "validation_history.csv";

/// Run metadata stamped onto every appended row
#[derive(Debug, Clone)]
pub struct RunStamp {
    /// Wall-clock display timestamp, local time
    pub timestamp: String,
    /// Unique, sortable identifier for this run
    pub run_id: String,
}

/// Last issued run identifier, used to disambiguate runs that land in the
/// same UTC second within one process.
static LAST_RUN_ID: Mutex<Option<String>> = Mutex::new(None);

impl RunStamp {
    pub fn now() -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            run_id: unique_run_id(),
        }
    }
}

/// Second-precision UTC identifier, made unique per run. A same-second
/// collision gets a zero-padded suffix that still sorts between the bare
/// identifier and the next second's.
fn unique_run_id() -> String {
    let base = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let mut last = LAST_RUN_ID.lock().unwrap();

    let id = match last.as_deref() {
        Some(prev) if prev.starts_with(&base) => {
            let sequence: u32 = prev
                .strip_prefix(&base)
                .and_then(|s| s.strip_prefix('-'))
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            format!("{}-{:04}", base, sequence + 1)
        }
        _ => base,
    };

    *last = Some(id.clone());
    id
}

pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append the summary, stamped with run metadata, to the history file.
    /// Returns the total number of history rows after the append.
    ///
    /// An unreadable or column-incompatible existing file is treated as
    /// absent, with an explicit warning; the new rows then become the entire
    /// history.
    pub fn append(
        &self,
        summary: &Table,
        stamp: &RunStamp,
        log: &mut RunLog,
    ) -> Result<usize, DetectError> {
        let mut entry = summary.clone();
        entry.push_constant_column("Run_Timestamp", &stamp.timestamp);
        entry.push_constant_column("Run_ID", &stamp.run_id);

        let mut history = if self.path.exists() {
            match Table::read_csv(&self.path) {
                Ok(existing) if existing.columns == entry.columns => existing,
                Ok(existing) => {
                    let err = DetectError::HistoryCorruption {
                        path: self.path.clone(),
                        message: format!(
                            "column set {:?} does not match {:?}; starting fresh, prior rows lost",
                            existing.columns, entry.columns
                        ),
                    };
                    warn!("{err}");
                    log.push(err.to_string());
                    Table::new(entry.columns.clone())
                }
                Err(e) => {
                    let err = DetectError::HistoryCorruption {
                        path: self.path.clone(),
                        message: format!("{e:#}; starting fresh, prior rows lost"),
                    };
                    warn!("{err}");
                    log.push(err.to_string());
                    Table::new(entry.columns.clone())
                }
            }
        } else {
            Table::new(entry.columns.clone())
        };

        // Existing rows keep their order and content; new rows go after
        history.rows.extend(entry.rows);

        history
            .write_csv(&self.path)
            .map_err(|e| DetectError::SerializationFailure {
                artifact: HISTORY_FILENAME.to_string(),
                message: format!("{e:#}"),
            })?;

        Ok(history.len())
    }
}

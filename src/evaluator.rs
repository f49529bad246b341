//! Dual-backend evaluation of the anomaly catalog.
//!
//! A run starts on the relational backend and flips irrevocably to the
//! flat-file backend on the first relational failure (connect or any query).
//! Results already obtained before the failure are kept as-is. A definition
//! that fails on both backends degrades to a zero count; the run itself never
//! aborts here.

use log::{info, warn};

use crate::backend::{AnomalyResult, CatalogBackend, DbBackend, FileBackend};
use crate::catalog::CATALOG;
use crate::config::Config;
use crate::pipeline::RunLog;

/// Per-definition outcome. Callers inspect the variant instead of relying on
/// side-channel text logs.
#[derive(Debug)]
pub enum Outcome {
    Ok(AnomalyResult),
    /// The value could not be computed on any backend and was degraded
    /// (count zero), for the recorded reason.
    Degraded(AnomalyResult, String),
}

impl Outcome {
    pub fn result(&self) -> &AnomalyResult {
        match self {
            Outcome::Ok(r) | Outcome::Degraded(r, _) => r,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded(..))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded(_, reason) => Some(reason),
        }
    }
}

enum Mode {
    Db(DbBackend),
    File,
}

/// Evaluate the whole catalog, in catalog order, producing one outcome per
/// definition. The relational connection (if opened) is scoped to this call
/// and released on every exit path when the backend drops.
pub fn evaluate_catalog(config: &Config, log: &mut RunLog) -> Vec<Outcome> {
    let mut mode = match &config.database {
        Some(path) => match DbBackend::open(path) {
            Ok(backend) => {
                log.push(format!("Connected to database {:?}.", path));
                Mode::Db(backend)
            }
            Err(e) => {
                warn!("{e}");
                log.push(format!(
                    "Could not connect to database, falling back to flat files: {e}"
                ));
                Mode::File
            }
        },
        None => {
            log.push("No database configured, using flat files.".to_string());
            Mode::File
        }
    };

    let mut file_backend = FileBackend::new(config);
    let mut outcomes = Vec::with_capacity(CATALOG.len());

    for &kind in CATALOG {
        // Try the relational backend while it is still trusted
        if let Mode::Db(backend) = &mut mode {
            match backend.evaluate(kind) {
                Ok(result) => {
                    let line = format!("{kind}: {} ({})", result.count, backend.label());
                    info!("{line}");
                    log.push(line);
                    outcomes.push(Outcome::Ok(result));
                    continue;
                }
                Err(e) => {
                    warn!("{e}");
                    log.push(format!(
                        "Database query for {kind} failed, falling back to flat files: {e}"
                    ));
                    mode = Mode::File;
                }
            }
        }

        match file_backend.evaluate(kind) {
            Ok(result) => {
                let line = format!("{kind}: {} ({})", result.count, file_backend.label());
                info!("{line}");
                log.push(line);
                outcomes.push(Outcome::Ok(result));
            }
            Err(e) => {
                warn!("{e}");
                log.push(format!("{kind}: degraded to 0, no backend available: {e}"));
                outcomes.push(Outcome::Degraded(AnomalyResult::degraded(kind), e.to_string()));
            }
        }
    }

    outcomes
}

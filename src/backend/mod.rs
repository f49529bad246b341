//! Backend abstraction for the anomaly catalog.
//!
//! Both backends expose one capability: evaluate a catalog entry given its
//! declared data dependencies. The evaluator is backend-agnostic; numeric
//! results must match between backends for the same data.

pub mod db;
pub mod file;

pub use db::DbBackend;
pub use file::FileBackend;

use crate::catalog::AnomalyKind;
use crate::error::DetectError;
use crate::table::Table;

/// Result of evaluating one catalog entry. Computed fresh each run.
#[derive(Debug, Clone)]
pub struct AnomalyResult {
    pub kind: AnomalyKind,
    /// Scalar anomaly count. For `AirlineRank` this is the number of ranked
    /// rows retained, which never enters the summary table.
    pub count: u64,
    /// Rows matching the condition, shaped per definition
    pub detail: Option<Table>,
}

impl AnomalyResult {
    /// A zero-valued result standing in for a definition that could not be
    /// computed on any backend.
    pub fn degraded(kind: AnomalyKind) -> Self {
        Self {
            kind,
            count: 0,
            detail: None,
        }
    }
}

pub trait CatalogBackend {
    /// Short name used in log lines ("db", "file fallback")
    fn label(&self) -> &'static str;

    fn evaluate(&mut self, kind: AnomalyKind) -> Result<AnomalyResult, DetectError>;
}

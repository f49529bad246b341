use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy for a detection run.
///
/// Everything except `StorageUnavailable` is recoverable: it is caught at the
/// boundary where it occurs, recorded in the run log, and converted into a
/// degraded result. `StorageUnavailable` aborts the run.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The relational backend could not be reached. Triggers file fallback.
    #[error("failed to open database {path:?}: {source}")]
    ConnectionFailure {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A specific relational query errored. Triggers fallback for the
    /// definitions not yet resolved.
    #[error("query for '{name}' failed: {source}")]
    QueryFailure {
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// No fallback file exists for a required table.
    #[error("no input file found for '{table}' (tried .csv/.dat in each search path)")]
    MissingInputFile { table: &'static str },

    /// A fallback file exists but could not be read or parsed.
    #[error("failed to load '{table}': {message}")]
    InputUnreadable { table: &'static str, message: String },

    /// Writing one artifact failed. Other artifacts are unaffected.
    #[error("failed to write {artifact}: {message}")]
    SerializationFailure { artifact: String, message: String },

    /// The existing history file is unreadable. Treated as absent, with a
    /// logged warning; prior rows are lost.
    #[error("existing history at {path:?} is unreadable: {message}")]
    HistoryCorruption { path: PathBuf, message: String },

    /// The output directory cannot be created or written. Fatal.
    #[error("output directory {path:?} is unavailable: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DetectError {
    /// Whether this failure must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DetectError::StorageUnavailable { .. })
    }
}

//! Run configuration and input resolution.
//!
//! A [`Config`] carries everything a run needs: the relational database path
//! (if any), the output directory for artifacts, and the ordered list of
//! directories searched for flat-file fallback inputs. It is loaded from a
//! JSON file or assembled from CLI flags and passed into each component at
//! construction.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DetectError;
use crate::schema::TableSchema;

/// File extensions recognized for flat-file inputs, tried in order
const INPUT_EXTENSIONS: &[&str] = &["csv", "dat"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database path; `None` skips the relational backend entirely
    pub database: Option<PathBuf>,
    /// Directory for all output artifacts, created on demand
    pub output_dir: PathBuf,
    /// Directories searched (in order) for fallback input files
    pub input_search_paths: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            output_dir: PathBuf::from("outputs"),
            input_search_paths: vec![PathBuf::from("data/raw"), PathBuf::from("data")],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// Resolve the flat-file input for a table: the first existing candidate
    /// among each search path crossed with the recognized extensions.
    ///
    /// Pure lookup; resolving the same table twice with unchanged
    /// configuration returns the same path.
    pub fn resolve_input(&self, schema: &TableSchema) -> Result<PathBuf, DetectError> {
        for dir in &self.input_search_paths {
            for ext in INPUT_EXTENSIONS {
                let candidate = dir.join(format!("{}.{}", schema.file_stem, ext));
                if candidate.exists() {
                    return Ok(candidate);
                }
            }
        }
        Err(DetectError::MissingInputFile {
            table: schema.name,
        })
    }

    /// Create the output directory if absent. The only unrecoverable failure
    /// in the pipeline.
    pub fn ensure_output_dir(&self) -> Result<(), DetectError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| DetectError::StorageUnavailable {
            path: self.output_dir.clone(),
            source,
        })
    }

    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ROUTES;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_prefers_earlier_search_path_and_csv() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let base = dir.path().join("base");
        fs::create_dir_all(&raw).unwrap();
        fs::create_dir_all(&base).unwrap();
        fs::write(raw.join("routes.dat"), "").unwrap();
        fs::write(base.join("routes.csv"), "").unwrap();

        let config = Config {
            database: None,
            output_dir: dir.path().join("out"),
            input_search_paths: vec![raw.clone(), base],
        };

        // raw/ wins even though base/ holds the preferred extension
        assert_eq!(config.resolve_input(&ROUTES).unwrap(), raw.join("routes.dat"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("routes.csv"), "").unwrap();
        let config = Config {
            database: None,
            output_dir: dir.path().join("out"),
            input_search_paths: vec![dir.path().to_path_buf()],
        };

        let first = config.resolve_input(&ROUTES).unwrap();
        let second = config.resolve_input(&ROUTES).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let config = Config {
            database: None,
            output_dir: dir.path().join("out"),
            input_search_paths: vec![dir.path().to_path_buf()],
        };

        match config.resolve_input(&ROUTES) {
            Err(DetectError::MissingInputFile { table }) => assert_eq!(table, "routes"),
            other => panic!("expected MissingInputFile, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_config_from_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"database": "flights.db", "output_dir": "out", "input_search_paths": ["a", "b"]}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.database.as_deref(), Some(Path::new("flights.db")));
        assert_eq!(config.input_search_paths.len(), 2);
    }
}

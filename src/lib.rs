pub mod backend;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod table;

pub use catalog::{AnomalyKind, CATALOG};
pub use config::Config;
pub use error::DetectError;
pub use table::Table;

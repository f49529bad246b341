pub mod charts;
pub mod csv_out;

pub use csv_out::{build_summary, write_detail_tables, write_summary};

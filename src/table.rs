//! In-memory tabular values shared by both backends and the report writer.

use anyhow::{Context, Result};
use std::path::Path;

/// A small column-named table. Null cells serialize as empty CSV fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a column with the same value in every row
    pub fn push_constant_column(&mut self, name: &str, value: &str) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Some(value.to_string()));
        }
    }

    /// Write as a headed CSV file
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {:?}", path))?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush().context("failed to flush CSV")?;
        Ok(())
    }

    /// Read a headed CSV file. Empty fields become null cells.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open {:?}", path))?;
        let columns: Vec<String> = reader
            .headers()
            .context("failed to read CSV header")?
            .iter()
            .map(String::from)
            .collect();

        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record.context("failed to read CSV record")?;
            let row: Vec<Option<String>> = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect();
            table.rows.push(row);
        }
        Ok(table)
    }
}

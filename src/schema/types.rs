/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Coerced to i64 by the flat-file loader; unparseable values become null
    Integer,
    Text,
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self { name, col_type }
    }
}

/// Table schema definition
///
/// Flat-file inputs are header-less, so columns are assigned positionally in
/// the order given here; trailing fields beyond the schema are truncated.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    /// File stem looked up by the input resolver (`<stem>.csv` / `<stem>.dat`)
    pub file_stem: &'static str,
    pub columns: &'static [Column],
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Position of a column by name, if the schema defines it
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

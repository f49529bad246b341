//! Table schema definitions for the OpenFlights reference tables

use super::types::*;

pub static AIRPORTS: TableSchema = TableSchema {
    name: "airports",
    file_stem: "airports",
    columns: &[
        Column::new("Airport_ID", ColumnType::Integer),
        Column::new("Name", ColumnType::Text),
        Column::new("City", ColumnType::Text),
        Column::new("Country", ColumnType::Text),
        Column::new("IATA", ColumnType::Text),
        Column::new("ICAO", ColumnType::Text),
        Column::new("Latitude", ColumnType::Text),
        Column::new("Longitude", ColumnType::Text),
        Column::new("Altitude", ColumnType::Text),
        Column::new("Timezone", ColumnType::Text),
        Column::new("DST", ColumnType::Text),
        Column::new("Tz_database_time_zone", ColumnType::Text),
        Column::new("Type", ColumnType::Text),
        Column::new("Source", ColumnType::Text),
    ],
};

pub static AIRLINES: TableSchema = TableSchema {
    name: "airlines",
    file_stem: "airlines",
    columns: &[
        Column::new("Airline_ID", ColumnType::Integer),
        Column::new("Name", ColumnType::Text),
        Column::new("Alias", ColumnType::Text),
        Column::new("IATA", ColumnType::Text),
        Column::new("ICAO", ColumnType::Text),
        Column::new("Callsign", ColumnType::Text),
        Column::new("Country", ColumnType::Text),
        Column::new("Active", ColumnType::Text),
    ],
};

pub static ROUTES: TableSchema = TableSchema {
    name: "routes",
    file_stem: "routes",
    columns: &[
        Column::new("Airline", ColumnType::Text),
        Column::new("Airline_ID", ColumnType::Integer),
        Column::new("Source_airport", ColumnType::Text),
        Column::new("Source_airport_ID", ColumnType::Integer),
        Column::new("Destination_airport", ColumnType::Text),
        Column::new("Destination_airport_ID", ColumnType::Integer),
        Column::new("Codeshare", ColumnType::Text),
        Column::new("Stops", ColumnType::Text),
        Column::new("Equipment", ColumnType::Text),
    ],
};

/// All table schemas
pub static ALL_TABLES: &[&TableSchema] = &[&AIRPORTS, &AIRLINES, &ROUTES];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

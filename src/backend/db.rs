//! Relational evaluation of the anomaly catalog against SQLite.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use super::{AnomalyResult, CatalogBackend};
use crate::catalog::AnomalyKind;
use crate::error::DetectError;
use crate::table::Table;

const SQL_MISSING_SOURCE_AIRPORTS: &str = "
    SELECT r.*
    FROM routes r
    LEFT JOIN airports a ON r.Source_airport_ID = a.Airport_ID
    WHERE a.Airport_ID IS NULL";

const SQL_MISSING_DESTINATION_AIRPORTS: &str = "
    SELECT r.*
    FROM routes r
    LEFT JOIN airports a ON r.Destination_airport_ID = a.Airport_ID
    WHERE a.Airport_ID IS NULL";

const SQL_MISSING_AIRLINES: &str = "
    SELECT r.*
    FROM routes r
    LEFT JOIN airlines al ON r.Airline_ID = al.Airline_ID
    WHERE al.Airline_ID IS NULL";

const SQL_DUPLICATE_ROUTES: &str = "
    SELECT Airline_ID, Source_airport_ID, Destination_airport_ID, COUNT(*) AS dup_count
    FROM routes
    GROUP BY Airline_ID, Source_airport_ID, Destination_airport_ID
    HAVING COUNT(*) > 1
    ORDER BY Airline_ID, Source_airport_ID, Destination_airport_ID";

const SQL_INCOMPLETE_ROUTES: &str = "
    SELECT *
    FROM routes
    WHERE Airline_ID IS NULL
       OR Source_airport_ID IS NULL
       OR Destination_airport_ID IS NULL";

// Bundled SQLite ships no stddev aggregate, so the variance is derived from
// window averages and outliers are found by comparing squared deviation
// against (2*stddev)^2. Population variance, divisor N.
const SQL_OUTLIER_AIRPORTS: &str = "
    WITH route_counts AS (
        SELECT Source_airport_ID, COUNT(*) AS total_routes
        FROM routes
        GROUP BY Source_airport_ID
    ),
    route_stats AS (
        SELECT Source_airport_ID,
               total_routes,
               AVG(total_routes) OVER () AS avg_routes,
               AVG(total_routes * total_routes) OVER ()
                   - AVG(total_routes) OVER () * AVG(total_routes) OVER () AS var_routes
        FROM route_counts
    )
    SELECT Source_airport_ID, total_routes, avg_routes, var_routes
    FROM route_stats
    WHERE (total_routes - avg_routes) * (total_routes - avg_routes) > 4 * var_routes
    ORDER BY Source_airport_ID";

const SQL_AIRLINE_RANK: &str = "
    SELECT Airline_ID,
           COUNT(*) AS route_count,
           DENSE_RANK() OVER (ORDER BY COUNT(*) DESC) AS airline_rank
    FROM routes
    GROUP BY Airline_ID
    ORDER BY route_count DESC
    LIMIT 10";

/// Read-only SQLite evaluation of the catalog.
///
/// The connection is scoped to one run and closed when the backend drops,
/// on every exit path. Opening read-only means a missing database file is a
/// `ConnectionFailure` rather than an implicitly created empty database.
pub struct DbBackend {
    conn: Connection,
}

impl DbBackend {
    pub fn open(path: &Path) -> Result<Self, DetectError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |source| DetectError::ConnectionFailure {
                path: path.to_path_buf(),
                source,
            },
        )?;
        Ok(Self { conn })
    }

    fn query_table(&self, name: &'static str, sql: &str) -> Result<Table, DetectError> {
        self.try_query_table(sql)
            .map_err(|source| DetectError::QueryFailure { name, source })
    }

    fn try_query_table(&self, sql: &str) -> rusqlite::Result<Table> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = columns.len();

        let mut table = Table::new(columns);
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(cell_to_string(row.get_ref(idx)?));
            }
            table.rows.push(cells);
        }
        Ok(table)
    }
}

impl CatalogBackend for DbBackend {
    fn label(&self) -> &'static str {
        "db"
    }

    fn evaluate(&mut self, kind: AnomalyKind) -> Result<AnomalyResult, DetectError> {
        let name = kind.label();
        let table = match kind {
            AnomalyKind::MissingSourceAirports => {
                self.query_table(name, SQL_MISSING_SOURCE_AIRPORTS)?
            }
            AnomalyKind::MissingDestinationAirports => {
                self.query_table(name, SQL_MISSING_DESTINATION_AIRPORTS)?
            }
            AnomalyKind::MissingAirlines => self.query_table(name, SQL_MISSING_AIRLINES)?,
            AnomalyKind::DuplicateRoutes => self.query_table(name, SQL_DUPLICATE_ROUTES)?,
            AnomalyKind::IncompleteRoutes => self.query_table(name, SQL_INCOMPLETE_ROUTES)?,
            AnomalyKind::OutlierAirports => {
                variance_to_stddev(self.query_table(name, SQL_OUTLIER_AIRPORTS)?)
            }
            AnomalyKind::AirlineRank => self.query_table(name, SQL_AIRLINE_RANK)?,
        };

        Ok(AnomalyResult {
            kind,
            count: table.len() as u64,
            detail: Some(table),
        })
    }
}

fn cell_to_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

/// Replace the `var_routes` column with `std_routes` so the detail artifact
/// reports a standard deviation, matching the file backend.
fn variance_to_stddev(mut table: Table) -> Table {
    if let Some(idx) = table.column_index("var_routes") {
        table.columns[idx] = "std_routes".to_string();
        for row in &mut table.rows {
            row[idx] = row[idx]
                .as_deref()
                .and_then(|v| v.parse::<f64>().ok())
                .map(|var| var.max(0.0).sqrt().to_string());
        }
    }
    table
}

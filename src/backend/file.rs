//! In-memory evaluation of the anomaly catalog over flat files.
//!
//! Input files are header-less delimited text (OpenFlights `.dat`/`.csv`
//! dumps). Columns are assigned positionally from the table schema, extra
//! fields are truncated, and `Integer` columns are coerced with unparseable
//! values becoming null. Every computation mirrors its SQL counterpart so
//! counts match between backends.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::{AnomalyResult, CatalogBackend};
use crate::catalog::AnomalyKind;
use crate::config::Config;
use crate::error::DetectError;
use crate::schema::{ColumnType, TableSchema, AIRLINES, AIRPORTS, ROUTES};
use crate::table::Table;

/// Sentinel used by OpenFlights dumps for missing values
const NULL_SENTINEL: &str = "\\N";

struct RouteRow {
    cells: Vec<Option<String>>,
    airline_id: Option<i64>,
    source_id: Option<i64>,
    destination_id: Option<i64>,
}

struct RoutesData {
    columns: Vec<String>,
    rows: Vec<RouteRow>,
}

/// Flat-file evaluation of the catalog.
///
/// Tables are loaded lazily on first use and cached for the rest of the run.
/// A missing or unreadable input file fails every definition depending on
/// that table; the evaluator degrades those to zero.
pub struct FileBackend<'a> {
    config: &'a Config,
    routes: Option<RoutesData>,
    airport_ids: Option<HashSet<i64>>,
    airline_ids: Option<HashSet<i64>>,
}

impl<'a> FileBackend<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            routes: None,
            airport_ids: None,
            airline_ids: None,
        }
    }

    fn ensure_routes(&mut self) -> Result<(), DetectError> {
        if self.routes.is_none() {
            let path = self.config.resolve_input(&ROUTES)?;
            let rows = load_rows(&path, &ROUTES)?;

            let airline_idx = ROUTES.column_index("Airline_ID").unwrap();
            let source_idx = ROUTES.column_index("Source_airport_ID").unwrap();
            let dest_idx = ROUTES.column_index("Destination_airport_ID").unwrap();

            let rows = rows
                .into_iter()
                .map(|cells| RouteRow {
                    airline_id: parse_id(&cells[airline_idx]),
                    source_id: parse_id(&cells[source_idx]),
                    destination_id: parse_id(&cells[dest_idx]),
                    cells,
                })
                .collect();

            self.routes = Some(RoutesData {
                columns: ROUTES.column_names().iter().map(|s| s.to_string()).collect(),
                rows,
            });
        }
        Ok(())
    }

    fn ensure_airport_ids(&mut self) -> Result<(), DetectError> {
        if self.airport_ids.is_none() {
            let path = self.config.resolve_input(&AIRPORTS)?;
            self.airport_ids = Some(load_id_set(&path, &AIRPORTS, "Airport_ID")?);
        }
        Ok(())
    }

    fn ensure_airline_ids(&mut self) -> Result<(), DetectError> {
        if self.airline_ids.is_none() {
            let path = self.config.resolve_input(&AIRLINES)?;
            self.airline_ids = Some(load_id_set(&path, &AIRLINES, "Airline_ID")?);
        }
        Ok(())
    }

    /// Routes whose reference (selected by `key`) is null or absent from
    /// `known`. A null reference has no matching row, mirroring the SQL
    /// LEFT JOIN null-probe.
    fn missing_reference(
        &self,
        kind: AnomalyKind,
        known: &HashSet<i64>,
        key: fn(&RouteRow) -> Option<i64>,
    ) -> AnomalyResult {
        let routes = self.routes.as_ref().unwrap();
        let mut detail = Table::new(routes.columns.clone());
        for row in &routes.rows {
            let matched = key(row).map(|id| known.contains(&id)).unwrap_or(false);
            if !matched {
                detail.push_row(row.cells.clone());
            }
        }
        result_from_detail(kind, detail)
    }

    fn duplicate_routes(&self) -> AnomalyResult {
        let routes = self.routes.as_ref().unwrap();

        // Null keys group together, as in SQL GROUP BY
        let mut groups: BTreeMap<(Option<i64>, Option<i64>, Option<i64>), u64> = BTreeMap::new();
        for row in &routes.rows {
            *groups
                .entry((row.airline_id, row.source_id, row.destination_id))
                .or_insert(0) += 1;
        }

        let mut detail = Table::new(vec![
            "Airline_ID",
            "Source_airport_ID",
            "Destination_airport_ID",
            "dup_count",
        ]);
        for ((airline, source, destination), count) in groups {
            if count > 1 {
                detail.push_row(vec![
                    airline.map(|v| v.to_string()),
                    source.map(|v| v.to_string()),
                    destination.map(|v| v.to_string()),
                    Some(count.to_string()),
                ]);
            }
        }
        result_from_detail(AnomalyKind::DuplicateRoutes, detail)
    }

    fn incomplete_routes(&self) -> AnomalyResult {
        let routes = self.routes.as_ref().unwrap();
        let mut detail = Table::new(routes.columns.clone());
        for row in &routes.rows {
            if row.airline_id.is_none() || row.source_id.is_none() || row.destination_id.is_none()
            {
                detail.push_row(row.cells.clone());
            }
        }
        result_from_detail(AnomalyKind::IncompleteRoutes, detail)
    }

    fn outlier_airports(&self) -> AnomalyResult {
        let routes = self.routes.as_ref().unwrap();

        let mut counts: BTreeMap<Option<i64>, u64> = BTreeMap::new();
        for row in &routes.rows {
            *counts.entry(row.source_id).or_insert(0) += 1;
        }

        let totals: Vec<f64> = counts.values().map(|&c| c as f64).collect();
        let (mean, variance) = mean_and_population_variance(&totals);
        let stddev = variance.max(0.0).sqrt();

        let mut detail = Table::new(vec![
            "Source_airport_ID",
            "total_routes",
            "avg_routes",
            "std_routes",
        ]);
        for (airport, &count) in &counts {
            // Squared comparison, same as the SQL side: |x - mean| > 2*stddev
            let deviation = count as f64 - mean;
            if deviation * deviation > 4.0 * variance {
                detail.push_row(vec![
                    airport.map(|v| v.to_string()),
                    Some(count.to_string()),
                    Some(mean.to_string()),
                    Some(stddev.to_string()),
                ]);
            }
        }
        result_from_detail(AnomalyKind::OutlierAirports, detail)
    }

    fn airline_rank(&self) -> AnomalyResult {
        let routes = self.routes.as_ref().unwrap();

        let mut counts: BTreeMap<Option<i64>, u64> = BTreeMap::new();
        for row in &routes.rows {
            *counts.entry(row.airline_id).or_insert(0) += 1;
        }

        let mut ranked: Vec<(Option<i64>, u64)> = counts.into_iter().collect();
        // Descending by count; airline id breaks ties only to keep output
        // deterministic, rank values are what matters
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut detail = Table::new(vec!["Airline_ID", "route_count", "airline_rank"]);
        let mut rank = 0u64;
        let mut previous_count = None;
        for (airline, count) in ranked.into_iter() {
            if previous_count != Some(count) {
                rank += 1;
                previous_count = Some(count);
            }
            if detail.len() >= 10 {
                break;
            }
            detail.push_row(vec![
                airline.map(|v| v.to_string()),
                Some(count.to_string()),
                Some(rank.to_string()),
            ]);
        }
        result_from_detail(AnomalyKind::AirlineRank, detail)
    }
}

impl CatalogBackend for FileBackend<'_> {
    fn label(&self) -> &'static str {
        "file fallback"
    }

    fn evaluate(&mut self, kind: AnomalyKind) -> Result<AnomalyResult, DetectError> {
        match kind {
            AnomalyKind::MissingSourceAirports => {
                self.ensure_routes()?;
                self.ensure_airport_ids()?;
                let known = self.airport_ids.as_ref().unwrap();
                Ok(self.missing_reference(kind, known, |r| r.source_id))
            }
            AnomalyKind::MissingDestinationAirports => {
                self.ensure_routes()?;
                self.ensure_airport_ids()?;
                let known = self.airport_ids.as_ref().unwrap();
                Ok(self.missing_reference(kind, known, |r| r.destination_id))
            }
            AnomalyKind::MissingAirlines => {
                self.ensure_routes()?;
                self.ensure_airline_ids()?;
                let known = self.airline_ids.as_ref().unwrap();
                Ok(self.missing_reference(kind, known, |r| r.airline_id))
            }
            AnomalyKind::DuplicateRoutes => {
                self.ensure_routes()?;
                Ok(self.duplicate_routes())
            }
            AnomalyKind::IncompleteRoutes => {
                self.ensure_routes()?;
                Ok(self.incomplete_routes())
            }
            AnomalyKind::OutlierAirports => {
                self.ensure_routes()?;
                Ok(self.outlier_airports())
            }
            AnomalyKind::AirlineRank => {
                self.ensure_routes()?;
                Ok(self.airline_rank())
            }
        }
    }
}

fn result_from_detail(kind: AnomalyKind, detail: Table) -> AnomalyResult {
    AnomalyResult {
        kind,
        count: detail.len() as u64,
        detail: Some(detail),
    }
}

fn parse_id(cell: &Option<String>) -> Option<i64> {
    cell.as_deref().and_then(|v| v.parse::<i64>().ok())
}

/// Load a header-less delimited file, naming columns positionally from the
/// schema and truncating extra fields. Short records are padded with nulls.
fn load_rows(path: &Path, schema: &TableSchema) -> Result<Vec<Vec<Option<String>>>, DetectError> {
    let unreadable = |message: String| DetectError::InputUnreadable {
        table: schema.name,
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| unreadable(e.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| unreadable(e.to_string()))?;
        let cells = schema
            .columns
            .iter()
            .enumerate()
            .map(|(idx, col)| coerce_cell(record.get(idx).unwrap_or(""), col.col_type))
            .collect();
        rows.push(cells);
    }
    Ok(rows)
}

fn coerce_cell(raw: &str, col_type: ColumnType) -> Option<String> {
    if raw.is_empty() || raw == NULL_SENTINEL {
        return None;
    }
    match col_type {
        // Unparseable identifiers become null, not a fatal error
        ColumnType::Integer => raw.trim().parse::<i64>().ok().map(|v| v.to_string()),
        ColumnType::Text => Some(raw.to_string()),
    }
}

fn load_id_set(
    path: &Path,
    schema: &TableSchema,
    id_column: &str,
) -> Result<HashSet<i64>, DetectError> {
    let idx = schema
        .column_index(id_column)
        .expect("id column is part of the schema");
    let rows = load_rows(path, schema)?;
    Ok(rows.iter().filter_map(|row| parse_id(&row[idx])).collect())
}

fn mean_and_population_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn fixture_config(dir: &TempDir) -> Config {
        Config {
            database: None,
            output_dir: dir.path().join("out"),
            input_search_paths: vec![dir.path().to_path_buf()],
        }
    }

    fn write_fixture(dir: &TempDir, name: &str, lines: &[String]) {
        fs::write(dir.path().join(name), lines.join("\n")).unwrap();
    }

    fn airports_fixture(ids: &[i64]) -> Vec<String> {
        ids.iter()
            .map(|id| format!("{id},Airport {id},City,Country,AAA,AAAA,0,0,0,0,U,Zone,airport,test"))
            .collect()
    }

    fn route_line(airline: &str, source: &str, destination: &str) -> String {
        format!("XX,{airline},SRC,{source},DST,{destination},,0,CR2")
    }

    #[test]
    fn test_coerce_cell_nulls_and_ids() {
        assert_eq!(coerce_cell("", ColumnType::Text), None);
        assert_eq!(coerce_cell("\\N", ColumnType::Integer), None);
        assert_eq!(coerce_cell("42", ColumnType::Integer), Some("42".into()));
        assert_eq!(coerce_cell("4x2", ColumnType::Integer), None);
        assert_eq!(coerce_cell("4x2", ColumnType::Text), Some("4x2".into()));
    }

    #[test]
    fn test_missing_references_include_null_ids() {
        let dir = tempdir().unwrap();
        write_fixture(&dir, "airports.csv", &airports_fixture(&[1, 2]));
        write_fixture(&dir, "airlines.csv", &["10,Air Ten,,XX,XXX,TEN,Country,Y".into()]);
        write_fixture(
            &dir,
            "routes.csv",
            &[
                route_line("10", "1", "2"),   // fully valid
                route_line("10", "9", "2"),   // dangling source
                route_line("10", "\\N", "2"), // null source
                route_line("99", "1", "2"),   // dangling airline
            ],
        );

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);

        let source = backend.evaluate(AnomalyKind::MissingSourceAirports).unwrap();
        assert_eq!(source.count, 2);

        let airlines = backend.evaluate(AnomalyKind::MissingAirlines).unwrap();
        assert_eq!(airlines.count, 1);

        let dest = backend
            .evaluate(AnomalyKind::MissingDestinationAirports)
            .unwrap();
        assert_eq!(dest.count, 0);
    }

    #[test]
    fn test_duplicate_routes_counts_groups_not_rows() {
        let dir = tempdir().unwrap();
        write_fixture(
            &dir,
            "routes.csv",
            &[
                route_line("1", "1", "2"),
                route_line("1", "1", "2"),
                route_line("1", "1", "2"),
                route_line("2", "3", "4"),
            ],
        );

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);
        let result = backend.evaluate(AnomalyKind::DuplicateRoutes).unwrap();

        // one group of size 3, not 3 rows
        assert_eq!(result.count, 1);
        let detail = result.detail.unwrap();
        assert_eq!(detail.rows[0][3].as_deref(), Some("3"));
    }

    #[test]
    fn test_incomplete_routes_catches_any_null_reference() {
        let dir = tempdir().unwrap();
        write_fixture(
            &dir,
            "routes.csv",
            &[
                route_line("1", "1", "2"),
                route_line("\\N", "1", "2"),
                route_line("1", "", "2"),
                route_line("1", "1", "junk"),
            ],
        );

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);
        let result = backend.evaluate(AnomalyKind::IncompleteRoutes).unwrap();
        assert_eq!(result.count, 3);
    }

    #[test]
    fn test_outliers_use_population_stddev() {
        // Counts [2,2,2,2,100]: mean 21.6, population variance 1536.64,
        // stddev 39.2, upper bound exactly 100. Strict comparison keeps the
        // busy airport inside the bounds; a sample-stddev divisor would move
        // the bounds and a (wrong) inclusive comparison would flag it.
        let dir = tempdir().unwrap();
        let mut lines = Vec::new();
        for airport in 1..=4 {
            for _ in 0..2 {
                lines.push(route_line("1", &airport.to_string(), "999"));
            }
        }
        for _ in 0..100 {
            lines.push(route_line("1", "5", "999"));
        }
        write_fixture(&dir, "routes.csv", &lines);

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);
        let result = backend.evaluate(AnomalyKind::OutlierAirports).unwrap();
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_outlier_detected_beyond_bounds() {
        // Counts [1,1,1,1,1,1,1,1,1,50]: the 50-route airport is far outside
        // mean + 2*stddev.
        let dir = tempdir().unwrap();
        let mut lines = Vec::new();
        for airport in 1..=9 {
            lines.push(route_line("1", &airport.to_string(), "999"));
        }
        for _ in 0..50 {
            lines.push(route_line("1", "10", "999"));
        }
        write_fixture(&dir, "routes.csv", &lines);

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);
        let result = backend.evaluate(AnomalyKind::OutlierAirports).unwrap();
        assert_eq!(result.count, 1);
        let detail = result.detail.unwrap();
        assert_eq!(detail.rows[0][0].as_deref(), Some("10"));
        assert_eq!(detail.rows[0][1].as_deref(), Some("50"));
    }

    #[test]
    fn test_airline_rank_is_dense() {
        // Route counts A=5, B=5, C=3 dense-rank as 1, 1, 2
        let dir = tempdir().unwrap();
        let mut lines = Vec::new();
        for _ in 0..5 {
            lines.push(route_line("1", "1", "2"));
            lines.push(route_line("2", "1", "2"));
        }
        for _ in 0..3 {
            lines.push(route_line("3", "1", "2"));
        }
        write_fixture(&dir, "routes.csv", &lines);

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);
        let result = backend.evaluate(AnomalyKind::AirlineRank).unwrap();

        let detail = result.detail.unwrap();
        let ranks: Vec<&str> = detail
            .rows
            .iter()
            .map(|r| r[2].as_deref().unwrap())
            .collect();
        assert_eq!(ranks, vec!["1", "1", "2"]);
    }

    #[test]
    fn test_rank_detail_keeps_top_ten() {
        let dir = tempdir().unwrap();
        let mut lines = Vec::new();
        for airline in 1..=12 {
            for _ in 0..airline {
                lines.push(route_line(&airline.to_string(), "1", "2"));
            }
        }
        write_fixture(&dir, "routes.csv", &lines);

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);
        let result = backend.evaluate(AnomalyKind::AirlineRank).unwrap();

        let detail = result.detail.unwrap();
        assert_eq!(detail.len(), 10);
        // top entry is the airline with the most routes
        assert_eq!(detail.rows[0][0].as_deref(), Some("12"));
        assert_eq!(detail.rows[0][2].as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_routes_file_fails_evaluation() {
        let dir = tempdir().unwrap();
        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);

        let result = backend.evaluate(AnomalyKind::DuplicateRoutes);
        assert!(matches!(
            result,
            Err(DetectError::MissingInputFile { table: "routes" })
        ));
    }

    #[test]
    fn test_extra_fields_truncated_short_rows_padded() {
        let dir = tempdir().unwrap();
        write_fixture(
            &dir,
            "routes.csv",
            &[
                format!("{},surplus,fields", route_line("1", "1", "2")),
                "XX,1,SRC,1".to_string(),
            ],
        );

        let config = fixture_config(&dir);
        let mut backend = FileBackend::new(&config);
        let result = backend.evaluate(AnomalyKind::IncompleteRoutes).unwrap();

        // second row lacks a destination entirely
        assert_eq!(result.count, 1);
        let detail = result.detail.unwrap();
        assert_eq!(detail.columns.len(), 9);
    }
}

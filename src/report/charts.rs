//! PNG bar charts rendered from the in-memory tables, never by re-querying.
//!
//! Charts are drawn without captions or tick labels: text rendering in
//! plotters requires system fonts, and these artifacts must come out the same
//! on headless hosts with none installed. The CSV artifacts carry the labels.

use anyhow::Result;
use log::warn;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::DetectError;
use crate::pipeline::RunLog;
use crate::table::Table;

pub const SUMMARY_CHART_FILENAME: &str = "anomaly_summary_chart.png";
pub const TOP_AIRLINES_CHART_FILENAME: &str = "top_10_airlines_chart.png";

/// Render both charts, logging failures per artifact. Returns written paths.
pub fn render_all(
    config: &Config,
    summary: &Table,
    top_airlines: Option<&Table>,
    log: &mut RunLog,
) -> Vec<PathBuf> {
    let mut written = Vec::new();

    let summary_path = config.output_path(SUMMARY_CHART_FILENAME);
    record_chart(
        render_summary_chart(summary, &summary_path),
        SUMMARY_CHART_FILENAME,
        summary_path,
        log,
        &mut written,
    );

    if let Some(top) = top_airlines.filter(|t| !t.is_empty()) {
        let top_path = config.output_path(TOP_AIRLINES_CHART_FILENAME);
        record_chart(
            render_top_airlines_chart(top, &top_path),
            TOP_AIRLINES_CHART_FILENAME,
            top_path,
            log,
            &mut written,
        );
    }

    written
}

fn record_chart(
    result: Result<()>,
    filename: &str,
    path: PathBuf,
    log: &mut RunLog,
    written: &mut Vec<PathBuf>,
) {
    match result {
        Ok(()) => {
            log.push(format!("Saved {}.", filename));
            written.push(path);
        }
        Err(e) => {
            let err = DetectError::SerializationFailure {
                artifact: filename.to_string(),
                message: format!("{e:#}"),
            };
            warn!("{err}");
            log.push(err.to_string());
        }
    }
}

/// Horizontal bar chart of anomaly counts, smallest at the bottom
pub fn render_summary_chart(summary: &Table, path: &Path) -> Result<()> {
    let mut bars = labelled_counts(summary, "Anomaly_Type", "Count");
    bars.sort_by_key(|(_, count)| *count);

    let max = bars.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    if bars.is_empty() {
        root.present()?;
        return Ok(());
    }

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0u64..max + max / 5 + 1, 0usize..bars.len())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .y_labels(0)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(idx, (_, count))| {
        Rectangle::new([(0, idx), (*count, idx + 1)], BLUE.mix(0.6).filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Vertical bar chart of route counts for the top-ranked airlines
pub fn render_top_airlines_chart(top_airlines: &Table, path: &Path) -> Result<()> {
    let bars = labelled_counts(top_airlines, "Airline_ID", "route_count");
    let max = bars.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);

    let root = BitMapBackend::new(path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    if bars.is_empty() {
        root.present()?;
        return Ok(());
    }

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0usize..bars.len(), 0u64..max + max / 5 + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(0)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(idx, (_, count))| {
        Rectangle::new([(idx, 0), (idx + 1, *count)], GREEN.mix(0.6).filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Extract (label, count) pairs from two named columns. Null or unparseable
/// cells chart as empty labels / zero.
fn labelled_counts(table: &Table, label_column: &str, count_column: &str) -> Vec<(String, u64)> {
    let label_idx = table.column_index(label_column);
    let count_idx = table.column_index(count_column);
    let (Some(label_idx), Some(count_idx)) = (label_idx, count_idx) else {
        return Vec::new();
    };

    table
        .rows
        .iter()
        .map(|row| {
            let label = row[label_idx].clone().unwrap_or_default();
            let count = row[count_idx]
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            (label, count)
        })
        .collect()
}

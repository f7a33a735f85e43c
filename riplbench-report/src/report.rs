//! Report Data Structures

use crate::OutputFormat;
use chrono::{DateTime, Utc};
use riplbench_core::History;
use riplbench_stats::{SeriesSummary, compute_summary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A history together with its summaries and provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    /// Provenance
    pub meta: ReportMeta,
    /// The history as recorded
    pub history: History,
    /// One entry per series, in history order
    pub summaries: Vec<SeriesSummaryEntry>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Layout version, see [`SCHEMA_VERSION`](crate::SCHEMA_VERSION)
    pub schema_version: u32,
    /// riplbench version that produced the report
    pub version: String,
    /// When the report was built
    pub timestamp: DateTime<Utc>,
}

/// Summary of one series, addressed by metric name and label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummaryEntry {
    /// Metric name
    pub name: String,
    /// Series label
    pub label: String,
    /// Statistics of the series values
    pub summary: SeriesSummary,
}

/// Summarise every series of `history`
pub fn build_report(history: &History) -> HistoryReport {
    let summaries = history
        .name_to_series
        .iter()
        .flat_map(|(name, series_list)| {
            series_list.iter().map(move |series| SeriesSummaryEntry {
                name: name.clone(),
                label: series.label.clone(),
                summary: compute_summary(&series.as_f64s()),
            })
        })
        .collect();

    HistoryReport {
        meta: ReportMeta {
            schema_version: crate::SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        },
        history: history.clone(),
        summaries,
    }
}

/// Write `history` in each of `formats` into `directory`, creating it if needed.
///
/// Files are named after the history label. Returns the paths written.
pub fn write_reports(
    history: &History,
    directory: &Path,
    formats: &[OutputFormat],
) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(directory)?;

    let report = build_report(history);
    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let contents = match format {
            OutputFormat::Json => crate::generate_json_report(&report)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
            OutputFormat::Csv => crate::generate_csv_report(history),
            OutputFormat::Human => crate::format_human_output(&report),
        };
        let path = directory.join(format!("{}.{}", history.label, format.extension()));
        std::fs::write(&path, contents)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }

    tracing::info!("Reports written to {}", directory.display());
    Ok(written)
}

#![warn(missing_docs)]
//! riplbench Report - History Export
//!
//! Turns [`History`](riplbench_core::History) objects into files for
//! downstream rendering and analysis:
//! - JSON (full history, parameters and per-series summaries)
//! - CSV (long format, one row per recorded value)
//! - Human-readable terminal summary

mod csv;
mod human;
mod json;
mod report;

pub use csv::generate_csv_report;
pub use human::format_human_output;
pub use json::{SCHEMA_VERSION, generate_json_report};
pub use report::{HistoryReport, ReportMeta, SeriesSummaryEntry, build_report, write_reports};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// JSON document
    Json,
    /// Long-format CSV
    Csv,
    /// Human-readable text
    Human,
}

impl OutputFormat {
    /// File extension used when writing this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Human => "txt",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "human" | "text" | "txt" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

//! JSON Output

use crate::report::HistoryReport;

/// Version of the JSON document layout
pub const SCHEMA_VERSION: u32 = 1;

/// Generate a prettified JSON report
pub fn generate_json_report(report: &HistoryReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

//! Human-readable Output
//!
//! Terminal summary of a history: parameters, then one block per metric
//! with a line per labelled series.

use crate::report::HistoryReport;
use std::collections::BTreeMap;

/// Format a report for terminal display
pub fn format_human_output(report: &HistoryReport) -> String {
    let history = &report.history;
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!("riplbench: {}\n", history.label));
    output.push_str(&"=".repeat(60));
    output.push('\n');

    for (param, value) in &history.parameters {
        output.push_str(&format!("  {} = {}\n", param, value));
    }
    output.push('\n');

    let mut by_name: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for entry in &report.summaries {
        by_name.entry(entry.name.as_str()).or_default().push(entry);
    }

    for (name, entries) in by_name {
        output.push_str(&format!("{}\n", name));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for entry in entries {
            let s = &entry.summary;
            output.push_str(&format!(
                "  {:<12} n={:<6} mean: {:.4}  sd: {:.4}  median: {:.4}\n",
                entry.label, s.count, s.mean, s.std_dev, s.median
            ));
            output.push_str(&format!(
                "  {:<12} min: {:.4}  max: {:.4}  90% interval: [{:.4}, {:.4}]\n",
                "", s.min, s.max, s.p5, s.p95
            ));
            if s.non_finite > 0 {
                output.push_str(&format!(
                    "  {:<12} {} non-finite value(s) excluded\n",
                    "", s.non_finite
                ));
            }
        }
        output.push('\n');
    }

    output
}

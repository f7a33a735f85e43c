//! CSV Output
//!
//! Long format: one row per recorded value, so series of different lengths
//! share a single table.

use riplbench_core::History;

/// Generate `name,label,index,value` rows for every value in `history`
pub fn generate_csv_report(history: &History) -> String {
    let mut output = String::from("name,label,index,value\n");
    for (name, series_list) in &history.name_to_series {
        for series in series_list {
            for (index, value) in series.values.iter().enumerate() {
                output.push_str(&format!(
                    "{},{},{},{}\n",
                    escape(name),
                    escape(&series.label),
                    index,
                    value
                ));
            }
        }
    }
    output
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

//! Series and History
//!
//! A [`History`] groups [`Series`] by metric name. All series under one name
//! record the same logical quantity for different runs or sample sets,
//! distinguished by their label (`run 0`, `i.i.d.`, `prior`, ...).

use crate::model::Parameters;
use crate::value::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A labelled sequence of recorded values for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Run or sample-set label
    pub label: String,
    /// Values in recording order
    pub values: Vec<Scalar>,
    /// Whether renderers should also draw a histogram of this series
    pub histogrammed: bool,
}

impl Series {
    /// Create a series
    pub fn new(label: impl Into<String>, values: Vec<Scalar>, histogrammed: bool) -> Self {
        Self {
            label: label.into(),
            values,
            histogrammed,
        }
    }

    /// Append one value
    pub fn push(&mut self, value: impl Into<Scalar>) {
        self.values.push(value.into());
    }

    /// Number of recorded values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values converted to floats
    pub fn as_f64s(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.as_f64()).collect()
    }
}

/// Every series produced by one benchmarking operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Operation that produced this history (e.g. `run_from_joint`)
    pub label: String,
    /// Benchmark parameters in effect
    pub parameters: Parameters,
    /// Metric name to the series recorded for it
    pub name_to_series: BTreeMap<String, Vec<Series>>,
}

impl History {
    /// Create an empty history
    pub fn new(label: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            label: label.into(),
            parameters,
            name_to_series: BTreeMap::new(),
        }
    }

    /// Add a series under `name`
    pub fn add_series<V>(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        values: impl IntoIterator<Item = V>,
        histogrammed: bool,
    ) where
        V: Into<Scalar>,
    {
        let series = Series::new(
            label,
            values.into_iter().map(Into::into).collect(),
            histogrammed,
        );
        self.name_to_series
            .entry(name.into())
            .or_default()
            .push(series);
    }

    /// Series recorded under `name`
    pub fn series(&self, name: &str) -> Option<&[Series]> {
        self.name_to_series.get(name).map(Vec::as_slice)
    }

    /// Metric names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name_to_series.keys().map(String::as_str)
    }

    /// Total number of series across all names
    pub fn series_count(&self) -> usize {
        self.name_to_series.values().map(Vec::len).sum()
    }

    /// Directory name derived from the label and parameters,
    /// e.g. `run_from_joint_random_seed=7/`
    pub fn default_directory(&self) -> String {
        let mut name = self.label.clone();
        for (param, value) in &self.parameters {
            name.push('_');
            name.push_str(param);
            name.push('=');
            match value {
                serde_json::Value::String(s) => name.push_str(s),
                other => name.push_str(&other.to_string()),
            }
        }
        name.push('/');
        name
    }
}

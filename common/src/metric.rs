use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix EMON puts on every derived metric column.
pub const METRIC_PREFIX: &str = "metric_";

/// Metrics compared across runs, in plotting order. Names are the
/// system-wide column names, without any socket qualifier.
pub const BASE_METRICS: &[&str] = &[
    "metric_CPU utilization %",
    "metric_CPU operating frequency (in GHz)",
    "metric_CPU utilization% in kernel mode",
    "metric_CPI",
    "metric_core % cycles in license throttle",
    "metric_core % cycles in license level 1",
    "metric_core % cycles in license level 2",
    "metric_core % cycles in license level 3",
    "metric_core % cycles in license level 4",
    "metric_core % cycles in license level 5",
    "metric_core % cycles in license level 6",
];

/// Human readable metric name, used as chart title and output file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayLabel(String);

impl DisplayLabel {
    /// Derives the label of a base metric identifier, ie.
    /// `metric_CPU operating frequency (in GHz)` -> `Cpu Operating Frequency (In GHz)`
    pub fn from_metric(base: &str) -> Self {
        let stripped = base.replace(METRIC_PREFIX, "").replace(" in ", " ");
        Self(title_case(stripped.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the chart rendered for this label
    pub fn file_name(&self) -> String {
        let stem = self
            .0
            .chars()
            .map(|c| match c {
                ' ' | '/' | '\\' => '_',
                c => c,
            })
            .collect::<String>();
        format!("{stem}.png")
    }
}

impl fmt::Display for DisplayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DisplayLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Title-cases every run of alphabetic characters. Uniformly cased runs are
/// capitalized (`CPU` -> `Cpu`), mixed case runs only get their first letter
/// raised (`GHz` stays `GHz`).
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    for c in text.chars() {
        if c.is_alphabetic() {
            word.push(c);
        } else {
            flush_word(&mut word, &mut out);
            out.push(c);
        }
    }
    flush_word(&mut word, &mut out);
    out
}

fn flush_word(word: &mut String, out: &mut String) {
    if word.is_empty() {
        return;
    }
    let uniform = word.chars().all(char::is_lowercase) || word.chars().all(char::is_uppercase);
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        if uniform {
            out.extend(chars.flat_map(char::to_lowercase));
        } else {
            out.extend(chars);
        }
    }
    word.clear();
}

/// Ordered list of base metric identifiers a run compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCatalog {
    metrics: Vec<String>,
}

impl MetricCatalog {
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }

    /// The CPU telemetry metrics of an EMON export
    pub fn emon() -> Self {
        Self::new(BASE_METRICS.iter().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::emon()
    }
}

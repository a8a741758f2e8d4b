use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    metric::MetricCatalog,
    sheet::XAxis,
    source::{SourceDescriptor, emon_sources},
};

pub const DEFAULT_DATA_DIR: &str = "cpu_perf_analysis/data";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
/// Spreadsheet column holding the sample time
pub const DEFAULT_X_AXIS: &str = "A";

/// Everything a run needs, assembled once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sources: Vec<SourceDescriptor>,
    pub metrics: MetricCatalog,
    pub x_axis: XAxis,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn new(
        sources: Vec<SourceDescriptor>,
        metrics: MetricCatalog,
        x_axis: XAxis,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sources,
            metrics,
            x_axis,
            output_dir: output_dir.into(),
        }
    }

    /// The three EMON runs under `data_dir`, all catalog metrics
    pub fn emon(data_dir: &Path, output_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            emon_sources(data_dir),
            MetricCatalog::emon(),
            XAxis::parse(DEFAULT_X_AXIS),
            output_dir,
        )
    }

    pub fn source(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::emon(Path::new(DEFAULT_DATA_DIR), DEFAULT_OUTPUT_DIR)
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const SYSTEM_VIEW_SHEET: &str = "details system view";
pub const SOCKET_VIEW_SHEET: &str = "details socket view";
pub const SOCKET_QUALIFIER: &str = "socket 0";

/// How a source names the column of a base metric
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRule {
    /// The base identifier is the column name
    #[default]
    Identity,
    /// `<base> (<qualifier>)`, used by per-socket views
    SuffixWithQualifier(String),
}

impl ColumnRule {
    pub fn column(&self, base: &str) -> String {
        match self {
            ColumnRule::Identity => base.to_owned(),
            ColumnRule::SuffixWithQualifier(qualifier) => format!("{base} ({qualifier})"),
        }
    }
}

/// One workload run to compare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub sheet: String,
    pub column_rule: ColumnRule,
}

impl SourceDescriptor {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        sheet: impl Into<String>,
        column_rule: ColumnRule,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sheet: sheet.into(),
            column_rule,
        }
    }

    pub fn column(&self, base: &str) -> String {
        self.column_rule.column(base)
    }
}

/// The three inference runs, in legend order
pub fn emon_sources(data_dir: &Path) -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(
            "LLaMA 2",
            data_dir.join("EMONllama2.xlsx"),
            SYSTEM_VIEW_SHEET,
            ColumnRule::Identity,
        ),
        SourceDescriptor::new(
            "LLaMA 3",
            data_dir.join("EMONllama3.xlsx"),
            SYSTEM_VIEW_SHEET,
            ColumnRule::Identity,
        ),
        SourceDescriptor::new(
            "DeepSeek",
            data_dir.join("emon_new.xlsx"),
            SOCKET_VIEW_SHEET,
            ColumnRule::SuffixWithQualifier(SOCKET_QUALIFIER.to_owned()),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_sources_suffix_the_column() {
        let rule = ColumnRule::SuffixWithQualifier(SOCKET_QUALIFIER.to_owned());
        assert_eq!(rule.column("metric_CPI"), "metric_CPI (socket 0)");
    }

    #[test]
    fn identity_keeps_the_column() {
        assert_eq!(ColumnRule::Identity.column("metric_CPI"), "metric_CPI");
    }

    #[test]
    fn emon_sources_layout() {
        let sources = emon_sources(Path::new("data"));
        let names = sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["LLaMA 2", "LLaMA 3", "DeepSeek"]);

        assert_eq!(sources[0].path, Path::new("data/EMONllama2.xlsx"));
        assert_eq!(sources[1].sheet, SYSTEM_VIEW_SHEET);
        assert_eq!(sources[2].sheet, SOCKET_VIEW_SHEET);
        assert_eq!(sources[0].column("metric_CPI"), "metric_CPI");
        assert_eq!(sources[2].column("metric_CPI"), "metric_CPI (socket 0)");
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Column names and footer layout of a per-problem evaluation export.
///
/// Stored as a plain JSON object on disk; every field is optional and falls back
/// to the Gradescope convention:
/// ```json
/// {
///   "sid_column": "SID",
///   "timestamp_column": "Submission Time",
///   "adjustment_column": "Adjustment",
///   "score_column": "Score",
///   "footer_rows": 4
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    pub sid_column: String,
    pub timestamp_column: String,
    pub adjustment_column: String,
    pub score_column: String,
    /// Trailing non-student rows appended after the student rows.
    pub footer_rows: usize,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self {
            sid_column: "SID".to_string(),
            timestamp_column: "Submission Time".to_string(),
            adjustment_column: "Adjustment".to_string(),
            score_column: "Score".to_string(),
            footer_rows: 4,
        }
    }
}

impl ExportFormat {
    /// Loads the format from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let format: ExportFormat = serde_json::from_str(&content)?;
        Ok(format)
    }

    /// Loads from `path` when given, otherwise returns the default format.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Builder-style override for the footer row count.
    pub fn with_footer_rows(mut self, footer_rows: usize) -> Self {
        self.footer_rows = footer_rows;
        self
    }
}

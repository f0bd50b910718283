//! Data types shared by extraction, merging and report synthesis.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Student identifier, the join key across all problem exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Sid(pub i64);

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display label for a graded problem, derived from its export's file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProblemName(String);

impl ProblemName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Builds the label from a file name like `3_binary_search_trees.csv`.
    ///
    /// The leading ordering token and the extension are dropped and the remaining
    /// underscore-separated tokens are joined with spaces.
    pub fn from_file_name(file_name: &str) -> Self {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let words: Vec<&str> = stem.split('_').skip(1).collect();
        Self(words.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProblemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders marks without trailing zeros, so `3.0` reads `3` and `0.30` reads `0.3`.
pub fn display_marks(marks: Decimal) -> String {
    marks.normalize().to_string()
}

/// One student's result on one problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub score: Decimal,
    /// Rubric items flagged for this student, in source column order. Empty when none were.
    pub applied_rubrics: Vec<String>,
}

/// Extractor output for a single problem export.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemTable {
    pub problem: ProblemName,
    /// Every rubric column of the export, in column order.
    pub rubric_items: Vec<String>,
    /// Keyed by SID; `None` collects a row whose SID cell was blank.
    pub records: BTreeMap<Option<Sid>, StudentRecord>,
}

/// A student's row in the merged table.
///
/// `sid` is `None` only when an export carried a blank SID cell. `cells[i]`
/// belongs to the i-th problem of the owning [`MergedTable`]; `None` means the
/// student has no record in that problem's export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub sid: Option<Sid>,
    pub cells: Vec<Option<StudentRecord>>,
}

/// Outer join of all problem tables, one row per student in ascending SID order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MergedTable {
    pub problems: Vec<ProblemName>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn row(&self, sid: Sid) -> Option<&MergedRow> {
        self.rows
            .binary_search_by_key(&Some(sid), |r| r.sid)
            .ok()
            .map(|i| &self.rows[i])
    }
}

/// Synthesized plain-text report for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report(String);

impl Report {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The merged table with its report column attached.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompiledTable {
    pub table: MergedTable,
    pub reports: BTreeMap<Sid, Report>,
}

impl CompiledTable {
    pub fn report_for(&self, sid: Sid) -> Option<&Report> {
        self.reports.get(&sid)
    }

    pub fn problems(&self) -> &[ProblemName] {
        &self.table.problems
    }
}

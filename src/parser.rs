//! Parser for per-problem evaluation exports.
//!
//! Turns one export CSV into a [`ProblemTable`]: each student's score and the
//! rubric items flagged for them. Locating the columns is a separate step,
//! [`ExportSchema::from_headers`], so format quirks stay out of the merge logic.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::ExportFormat;
use crate::error::{Result, RubricError};
use crate::merger::types::{ProblemName, ProblemTable, Sid, StudentRecord};

/// Column positions of an export, resolved from its header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSchema {
    pub sid: usize,
    pub score: usize,
    /// `(index, name)` for every rubric column, left to right.
    pub rubrics: Vec<(usize, String)>,
}

impl ExportSchema {
    /// Resolves the key columns and the rubric span.
    ///
    /// Rubric columns are everything strictly between the timestamp column and
    /// the adjustment column.
    pub fn from_headers(headers: &StringRecord, format: &ExportFormat, file: &str) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| RubricError::malformed(file, format!("missing column `{name}`")))
        };

        let sid = find(&format.sid_column)?;
        let score = find(&format.score_column)?;
        let timestamp = find(&format.timestamp_column)?;
        let adjustment = find(&format.adjustment_column)?;

        if timestamp >= adjustment {
            return Err(RubricError::malformed(
                file,
                format!(
                    "`{}` must come before `{}`",
                    format.timestamp_column, format.adjustment_column
                ),
            ));
        }

        let rubrics = headers
            .iter()
            .enumerate()
            .take(adjustment)
            .skip(timestamp + 1)
            .map(|(i, name)| (i, name.to_string()))
            .collect();

        Ok(Self {
            sid,
            score,
            rubrics,
        })
    }

    pub fn rubric_names(&self) -> Vec<String> {
        self.rubrics.iter().map(|(_, n)| n.clone()).collect()
    }
}

/// Reads an export file and extracts its [`ProblemTable`].
///
/// The problem name comes from the file name (see [`ProblemName::from_file_name`]).
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn extract_file(path: &Path, format: &ExportFormat) -> Result<ProblemTable> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let problem = ProblemName::from_file_name(&file_name);
    let file = File::open(path)?;

    let table = parse_export(problem, &file_name, file, format)?;
    debug!(
        problem = %table.problem,
        students = table.records.len(),
        rubric_items = table.rubric_items.len(),
        "Export parsed"
    );
    Ok(table)
}

/// Parses an export from any reader.
///
/// `source` only labels errors. The last `format.footer_rows` records are
/// discarded before any row is interpreted.
pub fn parse_export<R: Read>(
    problem: ProblemName,
    source: &str,
    reader: R,
    format: &ExportFormat,
) -> Result<ProblemTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let schema = ExportSchema::from_headers(&headers, format, source)?;

    let mut records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    if records.len() < format.footer_rows {
        return Err(RubricError::malformed(
            source,
            format!(
                "expected at least {} footer rows, found {} rows",
                format.footer_rows,
                records.len()
            ),
        ));
    }
    records.truncate(records.len() - format.footer_rows);

    let mut students = BTreeMap::new();
    for (line, record) in records.iter().enumerate() {
        let sid = parse_sid(record.get(schema.sid), source, line)?;
        let score = parse_score(record.get(schema.score), source, line)?;
        let applied_rubrics = schema
            .rubrics
            .iter()
            .filter(|(i, _)| record.get(*i).is_some_and(is_applied))
            .map(|(_, name)| name.clone())
            .collect();

        let previous = students.insert(
            sid,
            StudentRecord {
                score,
                applied_rubrics,
            },
        );
        if previous.is_some() {
            warn!(file = source, sid = ?sid, "Duplicate SID in export, keeping the later row");
        }
    }

    Ok(ProblemTable {
        problem,
        rubric_items: schema.rubric_names(),
        records: students,
    })
}

fn parse_sid(cell: Option<&str>, source: &str, line: usize) -> Result<Option<Sid>> {
    let text = cell.unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(|v| Some(Sid(v)))
        .map_err(|_| RubricError::malformed(source, format!("row {}: bad SID `{text}`", line + 1)))
}

fn parse_score(cell: Option<&str>, source: &str, line: usize) -> Result<Decimal> {
    let text = cell.unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(Decimal::ZERO);
    }
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| RubricError::malformed(source, format!("row {}: bad score `{text}`", line + 1)))
}

/// A rubric cell counts as applied when it reads as boolean true.
fn is_applied(cell: &str) -> bool {
    let cell = cell.trim();
    cell.eq_ignore_ascii_case("true") || cell == "1"
}

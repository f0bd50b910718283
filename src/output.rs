//! Output formatting and persistence for compiled reports.
//!
//! Supports pretty-printing, JSON serialization, a merged CSV table, and one
//! text file per student.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::merger::types::{CompiledTable, display_marks};
use csv::WriterBuilder;
use std::fmt::Debug;
use std::fs;
use std::path::Path;

/// Separator used when a list of applied rubric items is flattened into one CSV cell.
pub const RUBRIC_SEPARATOR: &str = "; ";

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns the SID → report mapping as a JSON object.
pub fn reports_json(compiled: &CompiledTable) -> Result<String> {
    Ok(serde_json::to_string_pretty(&compiled.reports)?)
}

/// Writes the merged table, report column included, as CSV.
///
/// Each problem contributes a `{problem} score` and a `{problem} applied_rubrics`
/// column. Cells for problems a student was not graded on are left empty.
pub fn write_merged_csv(path: &Path, compiled: &CompiledTable) -> Result<()> {
    debug!(path = %path.display(), rows = compiled.table.rows.len(), "Writing merged CSV");

    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header = vec!["SID".to_string()];
    for problem in compiled.problems() {
        header.push(format!("{problem} score"));
        header.push(format!("{problem} applied_rubrics"));
    }
    header.push("report".to_string());
    writer.write_record(&header)?;

    for row in &compiled.table.rows {
        let mut record = vec![row.sid.map(|s| s.to_string()).unwrap_or_default()];
        for cell in &row.cells {
            match cell {
                Some(r) => {
                    record.push(display_marks(r.score));
                    record.push(r.applied_rubrics.join(RUBRIC_SEPARATOR));
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        let report = row
            .sid
            .and_then(|sid| compiled.report_for(sid))
            .map(|r| r.to_string())
            .unwrap_or_default();
        record.push(report);
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes each report to `{dir}/{sid}.txt`, creating `dir` if needed.
pub fn write_reports(dir: &Path, compiled: &CompiledTable) -> Result<usize> {
    fs::create_dir_all(dir)?;

    for (sid, report) in &compiled.reports {
        fs::write(dir.join(format!("{sid}.txt")), report.as_str())?;
    }

    info!(dir = %dir.display(), count = compiled.reports.len(), "Reports written");
    Ok(compiled.reports.len())
}

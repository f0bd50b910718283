//! Merging per-problem tables and synthesizing per-student reports.
//!
//! [`merge::merge`] outer-joins the extracted tables on SID, keeping absent
//! problems explicit, and [`report::compile_reports`] renders one report per
//! student from the merged rows. [`compile`] runs both.

pub mod merge;
pub mod report;
pub mod types;

use crate::error::Result;
use crate::merger::types::{CompiledTable, ProblemTable};
use tracing::info;

/// Merges `tables` (in problem order) and attaches a report to every row.
pub fn compile(tables: Vec<ProblemTable>) -> Result<CompiledTable> {
    let table = merge::merge(tables);
    let reports = report::compile_reports(&table)?;

    info!(
        problems = table.problems.len(),
        students = table.rows.len(),
        "Reports compiled"
    );

    Ok(CompiledTable { table, reports })
}

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{Result, RubricError};
use crate::merger::types::{MergedRow, MergedTable, ProblemName, Report, Sid, display_marks};

/// One problem's contribution to a report, with absence already resolved.
struct ProblemBlock<'a> {
    problem: &'a ProblemName,
    marks: Decimal,
    rubrics: &'a [String],
}

/// Builds the report text for one merged row.
///
/// The first pass resolves every problem's marks (absent counts as 0) and sums
/// the total; the second renders the summary header with that total followed
/// by one block per problem in `problems` order.
pub fn synthesize(sid: Sid, row: &MergedRow, problems: &[ProblemName]) -> Report {
    let blocks: Vec<ProblemBlock<'_>> = problems
        .iter()
        .zip(&row.cells)
        .map(|(problem, cell)| match cell {
            Some(record) => ProblemBlock {
                problem,
                marks: record.score,
                rubrics: &record.applied_rubrics,
            },
            None => ProblemBlock {
                problem,
                marks: Decimal::ZERO,
                rubrics: &[],
            },
        })
        .collect();
    let total_marks: Decimal = blocks.iter().map(|b| b.marks).sum();

    let mut lines = vec![
        "Summary:".to_string(),
        format!(" - SID: {}", sid),
        format!(" - Total marks: {}", display_marks(total_marks)),
        String::new(),
    ];
    for block in &blocks {
        lines.push(format!("{} ({} marks):", block.problem, display_marks(block.marks)));
        lines.extend(block.rubrics.iter().map(|r| format!(" - {}", r)));
        lines.push(String::new());
    }

    Report::new(lines.join("\n"))
}

/// Synthesizes a report for every row of `table`, keyed by SID.
///
/// # Errors
///
/// Returns [`RubricError::UnresolvedStudent`] when a row has no SID or its cell
/// count disagrees with the table's problem list.
pub fn compile_reports(table: &MergedTable) -> Result<BTreeMap<Sid, Report>> {
    let mut reports = BTreeMap::new();

    for (index, row) in table.rows.iter().enumerate() {
        let Some(sid) = row.sid else {
            return Err(RubricError::UnresolvedStudent {
                row: index,
                reason: "SID is blank".to_string(),
            });
        };
        if row.cells.len() != table.problems.len() {
            return Err(RubricError::UnresolvedStudent {
                row: index,
                reason: format!(
                    "SID {} has {} cells for {} problems",
                    sid,
                    row.cells.len(),
                    table.problems.len()
                ),
            });
        }

        reports.insert(sid, synthesize(sid, row, &table.problems));
    }

    Ok(reports)
}

use crate::merger::types::{MergedRow, MergedTable, ProblemTable, Sid, StudentRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Outer-joins per-problem tables on SID.
///
/// Problems keep the order they are passed in. Every SID seen in any table gets
/// exactly one row; problems that never graded that student leave `None` in
/// the corresponding cell.
pub fn merge(tables: Vec<ProblemTable>) -> MergedTable {
    let width = tables.len();
    let mut problems = Vec::with_capacity(width);
    let mut rows: BTreeMap<Option<Sid>, Vec<Option<StudentRecord>>> = BTreeMap::new();

    for (column, table) in tables.into_iter().enumerate() {
        debug!(
            problem = %table.problem,
            column,
            students = table.records.len(),
            "Merging problem table"
        );
        problems.push(table.problem);

        for (sid, record) in table.records {
            rows.entry(sid).or_insert_with(|| vec![None; width])[column] = Some(record);
        }
    }

    MergedTable {
        problems,
        rows: rows
            .into_iter()
            .map(|(sid, cells)| MergedRow { sid, cells })
            .collect(),
    }
}

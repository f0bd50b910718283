//! Aggregate statistics over extracted problems and compiled reports.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::merger::types::{CompiledTable, ProblemTable};

/// Score distribution and rubric usage for one problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemStats {
    pub problem: String,
    pub students: usize,
    pub mean_score: f64,
    pub stddev_score: f64,
    /// `(rubric item, students it was applied to)`, in column order.
    pub rubric_counts: Vec<(String, usize)>,
}

impl ProblemStats {
    pub fn from_table(table: &ProblemTable) -> Self {
        let scores: Vec<f64> = table
            .records
            .values()
            .map(|r| r.score.to_f64().unwrap_or_default())
            .collect();
        let mean_score = mean(&scores);

        let rubric_counts = table
            .rubric_items
            .iter()
            .map(|item| {
                let applied = table
                    .records
                    .values()
                    .filter(|r| r.applied_rubrics.contains(item))
                    .count();
                (item.clone(), applied)
            })
            .collect();

        Self {
            problem: table.problem.to_string(),
            students: scores.len(),
            mean_score,
            stddev_score: stddev(&scores, mean_score),
            rubric_counts,
        }
    }
}

/// Totals across all problems, computed from the compiled table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalStats {
    pub students: usize,
    pub mean_total: f64,
    pub stddev_total: f64,
}

impl TotalStats {
    /// Missing problems count as 0, the same way reports total them.
    pub fn from_compiled(compiled: &CompiledTable) -> Self {
        let totals: Vec<f64> = compiled
            .table
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .flatten()
                    .map(|r| r.score)
                    .sum::<Decimal>()
                    .to_f64()
                    .unwrap_or_default()
            })
            .collect();
        let mean_total = mean(&totals);

        Self {
            students: totals.len(),
            mean_total,
            stddev_total: stddev(&totals, mean_total),
        }
    }
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

//! Finds export files in a directory and loads them in problem order.
//!
//! Exports are named `{n}_{problem_name}.csv`; `n` fixes the order problems
//! appear in every report.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::ExportFormat;
use crate::error::{Result, RubricError};
use crate::merger::compile;
use crate::merger::types::{CompiledTable, ProblemTable};
use crate::parser::extract_file;

/// An export file with its ordering prefix parsed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub order: u64,
    pub path: PathBuf,
}

/// Lists the export files in `dir`, sorted ascending by numeric prefix.
///
/// Ties on the prefix fall back to the file name. Files that are not `.csv` or
/// have no numeric prefix are skipped.
pub fn discover(dir: &Path) -> Result<Vec<ExportFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type()?.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some("csv")
        {
            continue;
        }

        match path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(order_prefix)
        {
            Some(order) => files.push(ExportFile { order, path }),
            None => debug!(path = %path.display(), "Skipping file without numeric prefix"),
        }
    }

    files.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

fn order_prefix(file_name: &str) -> Option<u64> {
    let (prefix, _) = file_name.split_once('_')?;
    prefix.parse().ok()
}

/// Extracts every file in order. Stops at the first failure.
pub fn extract_all(files: &[ExportFile], format: &ExportFormat) -> Result<Vec<ProblemTable>> {
    files.iter().map(|f| extract_file(&f.path, format)).collect()
}

/// Discovers, extracts and compiles every export in `dir`.
///
/// Any malformed file fails the whole directory; no partial table is returned.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_directory(dir: &Path, format: &ExportFormat) -> Result<CompiledTable> {
    let files = discover(dir)?;
    info!(files = files.len(), "Export files discovered");

    let tables = extract_all(&files, format)?;
    compile(tables)
}

/// Same as [`load_directory`], but extracts up to `concurrency` files at once.
///
/// Every extraction task is joined before merging, and tables are put back in
/// discovery order, so the result is identical to the sequential path. On the
/// first failure the remaining tasks are aborted.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), concurrency = concurrency))]
pub async fn load_directory_concurrent(
    dir: PathBuf,
    format: ExportFormat,
    concurrency: usize,
) -> Result<CompiledTable> {
    let files = discover(&dir)?;
    info!(files = files.len(), concurrency, "Export files discovered");

    let semaphore = Arc::new(Semaphore::new(permits(concurrency)));
    let format = Arc::new(format);
    let mut tasks = JoinSet::new();
    let mut slots: Vec<Option<ProblemTable>> = vec![None; files.len()];

    for (index, file) in files.into_iter().enumerate() {
        let sem = semaphore.clone();
        let format = format.clone();
        tasks.spawn(async move {
            let _permit = sem.acquire_owned().await.map_err(task_error)?;
            let table = tokio::task::spawn_blocking(move || extract_file(&file.path, &format))
                .await
                .map_err(task_error)??;
            Ok::<_, RubricError>((index, table))
        });
    }

    // Barrier: every extraction finishes before anything is merged.
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(task_error).and_then(|r| r) {
            Ok((index, table)) => slots[index] = Some(table),
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    let tables = slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| RubricError::TaskFailed("an extraction task produced no table".to_string()))?;
    compile(tables)
}

/// Semaphore permits for a requested concurrency, kept within what tokio accepts.
fn permits(concurrency: usize) -> usize {
    concurrency.clamp(1, Semaphore::MAX_PERMITS)
}

fn task_error(e: impl std::fmt::Display) -> RubricError {
    RubricError::TaskFailed(e.to_string())
}

//! Merging partial observation tables.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, SamplerError};
use crate::observation::SampleObservation;
use crate::table::{read_observation_table, write_rows};

/// File extension of partial observation artifacts.
pub const ARTIFACT_EXTENSION: &str = "jsonl";

/// Concatenates tables, keeps the first row for every `(class_id,
/// sample_size)` and returns the rows in key order.
///
/// Merging is idempotent: feeding the same table twice yields the same rows
/// as feeding it once.
///
/// ```
/// use legality_sampler::merge::merge;
/// use legality_sampler::SampleObservation;
///
/// let row = |id, n, p| SampleObservation { class_id: id, sample_size: n, legal_ratio: p, std_error: 0.0 };
/// let a = vec![row(2, 100, 0.5), row(1, 100, 0.25)];
/// let b = vec![row(1, 100, 0.75), row(1, 200, 0.5)];
///
/// let merged = merge([a, b]);
/// assert_eq!(merged, vec![row(1, 100, 0.25), row(1, 200, 0.5), row(2, 100, 0.5)]);
/// ```
pub fn merge<I>(tables: I) -> Vec<SampleObservation>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = SampleObservation>,
{
    let mut seen = HashSet::new();
    let mut rows: Vec<SampleObservation> = tables
        .into_iter()
        .flatten()
        .filter(|row| seen.insert(row.key()))
        .collect();
    rows.sort_by_key(SampleObservation::key);
    rows
}

/// Outcome of merging artifact files into one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub files: Vec<PathBuf>,
    pub rows_read: usize,
    pub rows_written: usize,
}

impl MergeReport {
    pub fn duplicates(&self) -> usize {
        self.rows_read - self.rows_written
    }
}

/// Every artifact under `dir`, recursively, in sorted path order.
pub fn collect_artifacts(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SamplerError::InputMissing(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    walk(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| SamplerError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| SamplerError::io(dir, e))?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

/// Merges artifact files into `output`.
pub fn merge_files(files: &[PathBuf], output: impl AsRef<Path>) -> Result<MergeReport> {
    let output = output.as_ref();
    let mut rows_read = 0;
    let mut tables = Vec::with_capacity(files.len());
    for file in files {
        let table = read_observation_table(file)?;
        rows_read += table.len();
        tables.push(table);
    }

    let merged = merge(tables);
    let rows_written = write_rows(output, &merged)?;
    let report = MergeReport {
        files: files.to_vec(),
        rows_read,
        rows_written,
    };
    info!(
        event = "merge_end",
        files = report.files.len(),
        rows_read,
        rows_written,
        duplicates = report.duplicates(),
        output = %output.display(),
    );
    Ok(report)
}

/// Merges every artifact found under `input_dir` into `output`.
///
/// `output` itself is never an input, even when it lies inside `input_dir`.
/// A directory without artifacts only logs a warning and leaves `output`
/// untouched.
pub fn merge_dir(input_dir: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<MergeReport> {
    let input_dir = input_dir.as_ref();
    let output = output.as_ref();
    let mut files = collect_artifacts(input_dir)?;
    files.retain(|file| !same_file(file, output));
    if files.is_empty() {
        warn!(
            event = "merge_empty",
            input_dir = %input_dir.display(),
            "no partial tables found"
        );
        return Ok(MergeReport {
            files,
            rows_read: 0,
            rows_written: 0,
        });
    }
    merge_files(&files, output)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

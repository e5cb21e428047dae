//! Shard partitioning and the parallel sampling run.
//!
//! Each shard owns a contiguous slice of classes and its own artifact file
//! `legality_<index>.jsonl` in the work directory. Before dispatch the
//! coordinator reads every artifact in the work directory into one prior
//! table, so a rerun resumes each class whatever shard wrote it before.
//! Shards share nothing but the read-only estimator and that table; they
//! report back through [`ShardOutcome`] values and their artifacts.

use std::collections::HashMap;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use legality_core::{MaterialClass, ValidityOracle};
use rayon::prelude::*;
use tracing::{error, info};

use crate::error::{Result, SamplerError};
use crate::estimator::Estimator;
use crate::merge::{collect_artifacts, merge};
use crate::observation::SampleObservation;
use crate::table::{read_observation_table, TableWriter};

/// Splits `len` items into at most `shard_count` contiguous, non-empty ranges
/// of ceiling-divided size.
///
/// ```
/// use legality_sampler::shard::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
/// assert_eq!(partition(2, 4), vec![0..1, 1..2]);
/// assert!(partition(0, 4).is_empty());
/// ```
pub fn partition(len: usize, shard_count: usize) -> Vec<Range<usize>> {
    let shard_count = shard_count.max(1);
    let chunk = len.div_ceil(shard_count).max(1);
    (0..shard_count)
        .map(|i| (i * chunk).min(len)..((i + 1) * chunk).min(len))
        .filter(|r| !r.is_empty())
        .collect()
}

/// Orders classes heaviest first (descending diagram count, then ascending
/// id) and keeps `start..end`, truncated to `max_classes`.
pub fn select_classes(
    mut classes: Vec<MaterialClass>,
    start: usize,
    end: Option<usize>,
    max_classes: Option<usize>,
) -> Result<Vec<MaterialClass>> {
    let len = classes.len();
    let end = end.unwrap_or(len);
    if start >= end || end > len {
        return Err(SamplerError::InvalidRange { start, end, len });
    }

    classes.sort_by(|a, b| {
        b.diagram_count
            .cmp(&a.diagram_count)
            .then(a.id.cmp(&b.id))
    });
    let end = max_classes.map_or(end, |max| end.min(start.saturating_add(max)));
    Ok(classes.drain(start..end).collect())
}

const ARTIFACT_PREFIX: &str = "legality_";

/// Path of a shard's artifact.
pub fn artifact_path(work_dir: &Path, index: usize) -> PathBuf {
    work_dir.join(format!("{ARTIFACT_PREFIX}{index}.jsonl"))
}

fn is_shard_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(ARTIFACT_PREFIX))
}

/// Every shard artifact under `work_dir` in sorted path order, whichever run
/// or shard layout wrote it. A missing directory has none.
pub fn shard_artifacts(work_dir: &Path) -> Result<Vec<PathBuf>> {
    match collect_artifacts(work_dir) {
        Ok(files) => Ok(files.into_iter().filter(|f| is_shard_artifact(f)).collect()),
        Err(SamplerError::InputMissing(_)) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

/// Observations already recorded under `work_dir`, grouped by class in
/// ascending sample size.
pub fn load_prior(work_dir: &Path) -> Result<HashMap<u64, Vec<SampleObservation>>> {
    let files = shard_artifacts(work_dir)?;
    let mut tables = Vec::with_capacity(files.len());
    for file in &files {
        tables.push(read_observation_table(file)?);
    }

    let mut by_class: HashMap<u64, Vec<SampleObservation>> = HashMap::new();
    for row in merge(tables) {
        by_class.entry(row.class_id).or_default().push(row);
    }
    Ok(by_class)
}

/// What a finished shard did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardReport {
    pub index: usize,
    pub range: Range<usize>,
    pub artifact: PathBuf,
    /// Classes sampled in this run (at least one new observation).
    pub classes_sampled: usize,
    /// Classes whose prior observations already satisfied the stopping rules.
    pub classes_resumed: usize,
    pub observations_written: usize,
    pub duration: Duration,
}

/// Result of one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardOutcome {
    Completed(ShardReport),
    Failed {
        index: usize,
        range: Range<usize>,
        error: String,
    },
}

impl ShardOutcome {
    pub fn index(&self) -> usize {
        match self {
            ShardOutcome::Completed(report) => report.index,
            ShardOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ShardOutcome::Completed(_))
    }
}

/// Outcomes of every shard in a run, in shard order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<ShardOutcome>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn completed(&self) -> impl Iterator<Item = &ShardReport> {
        self.outcomes.iter().filter_map(|o| match o {
            ShardOutcome::Completed(report) => Some(report),
            ShardOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_completed()).count()
    }

    /// Artifacts under `work_dir` to merge after this run: every shard
    /// artifact recorded so far, except those of shards that failed in it.
    pub fn merge_inputs(&self, work_dir: &Path) -> Result<Vec<PathBuf>> {
        let failed: Vec<PathBuf> = self
            .outcomes
            .iter()
            .filter(|o| !o.is_completed())
            .map(|o| artifact_path(work_dir, o.index()))
            .collect();
        let mut files = shard_artifacts(work_dir)?;
        files.retain(|file| !failed.contains(file));
        Ok(files)
    }

    /// Turns the first failed shard into an error.
    pub fn check(&self) -> Result<()> {
        match self.outcomes.iter().find(|o| !o.is_completed()) {
            Some(ShardOutcome::Failed { index, error, .. }) => Err(SamplerError::Shard {
                index: *index,
                message: error.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Artifacts of completed shards, the inputs of the merge.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.completed().map(|r| r.artifact.clone()).collect()
    }

    pub fn observations_written(&self) -> usize {
        self.completed().map(|r| r.observations_written).sum()
    }
}

/// Runs the estimator over shards of a class list on a worker pool.
#[derive(Debug)]
pub struct ShardCoordinator<O> {
    estimator: Estimator<O>,
    work_dir: PathBuf,
    shard_count: usize,
    workers: usize,
}

impl<O: ValidityOracle> ShardCoordinator<O> {
    /// Takes shard and worker counts from the estimator's configuration.
    pub fn new(estimator: Estimator<O>, work_dir: impl Into<PathBuf>) -> Self {
        let shard_count = estimator.config().shard_count();
        let workers = estimator.config().worker_count();
        Self {
            estimator,
            work_dir: work_dir.into(),
            shard_count,
            workers,
        }
    }

    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Samples every class. Shard failures are reported, not propagated;
    /// only unreadable prior artifacts or a worker pool that cannot start
    /// are errors.
    pub fn run(&self, classes: &[MaterialClass]) -> Result<RunSummary> {
        let started = Instant::now();
        let prior = load_prior(&self.work_dir)?;
        let ranges = partition(classes.len(), self.shard_count);
        info!(
            event = "run_start",
            classes = classes.len(),
            shards = ranges.len(),
            workers = self.workers,
            prior_classes = prior.len(),
            work_dir = %self.work_dir.display(),
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("legality-worker-{i}"))
            .build()?;

        let outcomes: Vec<ShardOutcome> = pool.install(|| {
            ranges
                .into_par_iter()
                .enumerate()
                .map(|(index, range)| self.run_isolated(index, range, classes, &prior))
                .collect()
        });

        let summary = RunSummary {
            outcomes,
            duration: started.elapsed(),
        };
        info!(
            event = "run_end",
            shards = summary.outcomes.len(),
            failed = summary.failed(),
            observations = summary.observations_written(),
            duration_ms = summary.duration.as_millis() as u64,
        );
        Ok(summary)
    }

    fn run_isolated(
        &self,
        index: usize,
        range: Range<usize>,
        classes: &[MaterialClass],
        prior: &HashMap<u64, Vec<SampleObservation>>,
    ) -> ShardOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_shard(index, range.clone(), &classes[range.clone()], prior)
        }));
        let error = match result {
            Ok(Ok(report)) => return ShardOutcome::Completed(report),
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        error!(
            event = "shard_failed",
            shard = index,
            start = range.start,
            end = range.end,
            error = %error,
        );
        ShardOutcome::Failed {
            index,
            range,
            error,
        }
    }

    /// Samples one shard, skipping sample sizes already in `prior`, and
    /// appends new observations to the shard's artifact.
    pub fn run_shard(
        &self,
        index: usize,
        range: Range<usize>,
        classes: &[MaterialClass],
        prior: &HashMap<u64, Vec<SampleObservation>>,
    ) -> Result<ShardReport> {
        let started = Instant::now();
        let artifact = artifact_path(&self.work_dir, index);
        info!(
            event = "shard_start",
            shard = index,
            start = range.start,
            end = range.end,
            prior_classes = classes.iter().filter(|c| prior.contains_key(&c.id)).count(),
        );

        let mut writer = TableWriter::append(&artifact)?;
        let mut classes_sampled = 0;
        let mut classes_resumed = 0;
        for class in classes {
            let known = prior.get(&class.id).map(Vec::as_slice).unwrap_or_default();
            let rows = self.estimator.estimate_class(class, known);
            if rows.is_empty() {
                classes_resumed += 1;
                continue;
            }
            writer.write_all(&rows)?;
            writer.flush()?;
            classes_sampled += 1;
        }
        let observations_written = writer.finish()?;

        let report = ShardReport {
            index,
            range,
            artifact,
            classes_sampled,
            classes_resumed,
            observations_written,
            duration: started.elapsed(),
        };
        info!(
            event = "shard_end",
            shard = index,
            classes_sampled,
            classes_resumed,
            observations = observations_written,
            duration_ms = report.duration.as_millis() as u64,
        );
        Ok(report)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
#[path = "shard_tests.rs"]
mod tests;

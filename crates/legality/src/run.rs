//! Sampling entry point that hides the shard and merge wiring.

use std::path::Path;

use legality_config::SamplingConfig;
use legality_core::{MaterialClass, RuleEngine};
use legality_sampler::{merge_files, Estimator, MergeReport, RunSummary, ShardCoordinator};

/// Everything a sampling run produced.
#[derive(Debug, Clone)]
pub struct SamplingRun {
    pub summary: RunSummary,
    pub merge: MergeReport,
}

/// Samples `classes` into shard artifacts under `work_dir`, then merges the
/// shard artifacts in `work_dir` into `output`.
///
/// Observations recorded by earlier runs are merged too, so a rerun with a
/// different shard layout still reports classes it only resumed. Artifacts
/// of shards that failed in this run are left out; their classes can be
/// resumed by running again with the same work directory.
pub fn sample_and_merge(
    config: SamplingConfig,
    classes: &[MaterialClass],
    work_dir: &Path,
    output: &Path,
) -> legality_sampler::Result<SamplingRun> {
    config.validate()?;
    let estimator = Estimator::new(RuleEngine::default(), config);
    let summary = ShardCoordinator::new(estimator, work_dir).run(classes)?;
    let merge = merge_files(&summary.merge_inputs(work_dir)?, output)?;
    Ok(SamplingRun { summary, merge })
}

/// Like [`sample_and_merge`], reading `sampling.toml` from the working
/// directory when present.
pub fn run_sampling(
    classes: &[MaterialClass],
    work_dir: &Path,
    output: &Path,
) -> legality_sampler::Result<SamplingRun> {
    #[cfg(feature = "console")]
    legality_console::init();

    let config = SamplingConfig::load("sampling.toml").unwrap_or_default();
    sample_and_merge(config, classes, work_dir, output)
}

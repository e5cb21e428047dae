//! Legality Sampler - adaptive estimation, sharding, merging and analysis
//!
//! This crate turns material classes into legality estimates:
//! - [`Estimator`] samples one class until a stopping rule fires
//! - [`termination`] holds the stopping rules and their composition
//! - [`ShardCoordinator`] runs the estimator over shards on a worker pool
//! - [`merge`] deduplicates partial observation tables
//! - [`analysis`] aggregates estimates into global totals
//!
//! # Logging
//!
//! Events are emitted with `tracing` under the `legality_sampler` target:
//!
//! - INFO: `run_start`/`run_end`, `shard_start`/`shard_end`, `class_sampled`,
//!   `merge_end`, `analysis_summary`
//! - WARN: skipped table rows, diagram count fallbacks, missing results
//! - ERROR: `shard_failed`
//! - DEBUG: `class_done`, `class_budget_exhausted`

pub mod analysis;
pub mod error;
pub mod estimator;
pub mod merge;
pub mod observation;
pub mod scope;
pub mod shard;
pub mod stats;
pub mod table;
pub mod termination;

pub use analysis::{analyze, analyze_files, Analysis, AnalysisRow, ClassEstimate, GlobalSummary};
pub use error::{Result, SamplerError};
pub use estimator::{class_rng, Estimator};
pub use merge::{merge_dir, merge_files, MergeReport};
pub use observation::{SampleObservation, SampleTally};
pub use scope::ClassScope;
pub use shard::{
    partition, select_classes, shard_artifacts, RunSummary, ShardCoordinator, ShardOutcome,
    ShardReport,
};
pub use table::{MaterialRecord, TableWriter};

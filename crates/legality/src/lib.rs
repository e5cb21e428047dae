//! Legality - estimate how many chess diagrams are legal positions
//!
//! Enumerate material classes, sample each one against the rule engine, and
//! aggregate the estimates into a global count with propagated uncertainty.
//!
//! # Example
//!
//! ```rust
//! use legality::prelude::*;
//!
//! let class = MaterialClass::new(1, "K1Q1".parse().unwrap(), "K1".parse().unwrap()).unwrap();
//! assert_eq!(class.diagram_count.to_string(), "249984");
//!
//! let config = SamplingConfig::new().with_initial_sizes(vec![50, 100]).with_random_seed(1);
//! let estimator = Estimator::new(RuleEngine::default(), config);
//! let rows = estimator.estimate_class(&class, &[]);
//! assert!(rows.iter().all(|o| (0.0..=1.0).contains(&o.legal_ratio)));
//! ```

// Core model
pub use legality_core::{
    count_diagrams, ClassEnumerator, Color, Material, MaterialClass, Occupancy, PieceKind,
    Profile, RuleEngine, ShakmatyOracle, Square, ValidityOracle, Verdict, Violations,
};

// Configuration
pub use legality_config::{ConfigError, SamplingConfig, StoppingConfig, WorkerCount};

// Sampling, merging and analysis
pub use legality_sampler::{
    analyze, analyze_files, merge_dir, Analysis, ClassEstimate, Estimator, GlobalSummary,
    RunSummary, SampleObservation, SamplerError, ShardCoordinator,
};

/// Sampler modules (tables, stopping rules, statistics).
pub use legality_sampler as sampler;

#[cfg(feature = "console")]
pub use legality_console as console;

mod run;
pub use run::{run_sampling, sample_and_merge, SamplingRun};

pub mod prelude {
    pub use super::{
        ClassEnumerator, Estimator, Material, MaterialClass, Profile, RuleEngine,
        SampleObservation, SamplingConfig,
    };
    pub use super::{analyze, run_sampling, sample_and_merge};
}

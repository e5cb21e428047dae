//! Stopping rules for adaptive per-class sampling.
//!
//! A rule is asked after every recorded sample size whether the class has
//! been sampled enough. Rules compose with [`OrTermination`].

mod composite;
mod max_sample;
mod relative_difference;
mod relative_std;
mod time;

use std::fmt::Debug;

use legality_config::{SamplingConfig, StoppingConfig};

use crate::scope::ClassScope;

pub use composite::OrTermination;
pub use max_sample::MaxSampleTermination;
pub use relative_difference::RelativeDifferenceTermination;
pub use relative_std::RelativeStdTermination;
pub use time::TimeTermination;

/// Trait for determining when a class has been sampled enough.
pub trait Termination: Send + Debug {
    /// Returns true if no further sample size should be drawn.
    fn is_terminated(&self, scope: &ClassScope) -> bool;
}

impl<T: Termination + ?Sized> Termination for Box<T> {
    fn is_terminated(&self, scope: &ClassScope) -> bool {
        (**self).is_terminated(scope)
    }
}

/// An absent rule never terminates.
impl<T: Termination> Termination for Option<T> {
    fn is_terminated(&self, scope: &ClassScope) -> bool {
        self.as_ref().is_some_and(|t| t.is_terminated(scope))
    }
}

/// Builds the configured convergence rule.
pub fn stopping_rule(config: &SamplingConfig) -> Box<dyn Termination> {
    match config.stopping {
        StoppingConfig::RelativeStdError => {
            Box::new(RelativeStdTermination::new(config.rel_std_threshold))
        }
        StoppingConfig::RelativeDifference {
            rel_threshold,
            abs_threshold,
        } => Box::new(RelativeDifferenceTermination::new(
            rel_threshold,
            abs_threshold,
        )),
    }
}

/// The full rule set for one class: sample cap, optional time budget and the
/// configured convergence rule.
pub type ClassTermination =
    OrTermination<(MaxSampleTermination, Option<TimeTermination>, Box<dyn Termination>)>;

pub fn class_termination(config: &SamplingConfig) -> ClassTermination {
    OrTermination((
        MaxSampleTermination::new(config.max_sample),
        config.class_time_limit().map(TimeTermination::new),
        stopping_rule(config),
    ))
}

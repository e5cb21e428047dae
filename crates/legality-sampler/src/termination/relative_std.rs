//! Relative standard error convergence.

use super::Termination;
use crate::scope::ClassScope;

/// Terminates when the largest sample's relative standard error is below the
/// threshold.
///
/// A class with no legal sample has a relative error of `1.0` and keeps
/// sampling until another rule stops it.
///
/// # Example
///
/// ```
/// use legality_sampler::termination::RelativeStdTermination;
///
/// let term = RelativeStdTermination::new(0.05);
/// ```
#[derive(Debug, Clone)]
pub struct RelativeStdTermination {
    threshold: f64,
}

impl RelativeStdTermination {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Termination for RelativeStdTermination {
    fn is_terminated(&self, scope: &ClassScope) -> bool {
        scope
            .largest()
            .is_some_and(|o| o.rel_std() < self.threshold)
    }
}

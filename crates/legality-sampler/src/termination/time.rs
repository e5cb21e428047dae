//! Per-class wall-clock budget.

use std::time::Duration;

use super::Termination;
use crate::scope::ClassScope;

/// Terminates once the class has been sampled for longer than the limit.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use legality_sampler::termination::TimeTermination;
///
/// let term = TimeTermination::new(Duration::from_secs(30));
/// let term = TimeTermination::seconds(30);
/// let term = TimeTermination::millis(500);
/// ```
#[derive(Debug, Clone)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, scope: &ClassScope) -> bool {
        scope.elapsed() >= self.limit
    }
}

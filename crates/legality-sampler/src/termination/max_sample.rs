//! Sample size cap.

use super::Termination;
use crate::scope::ClassScope;

/// Terminates once a sample of at least `max_sample` has been recorded.
#[derive(Debug, Clone)]
pub struct MaxSampleTermination {
    max_sample: u64,
}

impl MaxSampleTermination {
    pub fn new(max_sample: u64) -> Self {
        Self { max_sample }
    }
}

impl Termination for MaxSampleTermination {
    fn is_terminated(&self, scope: &ClassScope) -> bool {
        scope
            .largest()
            .is_some_and(|o| o.sample_size >= self.max_sample)
    }
}

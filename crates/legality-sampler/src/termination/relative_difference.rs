//! Agreement between the two largest samples.

use super::Termination;
use crate::scope::ClassScope;

/// Terminates when the ratios of the two largest samples agree, either
/// relatively or absolutely.
///
/// Keeps sampling only while both `|a - b| / max(|b|, 1e-12) > rel_threshold`
/// and `|a - b| > abs_threshold`, where `a` is the largest sample's ratio and
/// `b` the runner-up's. Fewer than two samples never terminate.
#[derive(Debug, Clone)]
pub struct RelativeDifferenceTermination {
    rel_threshold: f64,
    abs_threshold: f64,
}

impl RelativeDifferenceTermination {
    pub fn new(rel_threshold: f64, abs_threshold: f64) -> Self {
        Self {
            rel_threshold,
            abs_threshold,
        }
    }
}

impl Termination for RelativeDifferenceTermination {
    fn is_terminated(&self, scope: &ClassScope) -> bool {
        let Some((largest, second)) = scope.two_largest() else {
            return false;
        };
        let abs_diff = (largest.legal_ratio - second.legal_ratio).abs();
        let rel_diff = abs_diff / second.legal_ratio.abs().max(1e-12);
        rel_diff <= self.rel_threshold || abs_diff <= self.abs_threshold
    }
}

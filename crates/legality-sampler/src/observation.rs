//! Sample observations and per-sample tallies.

use serde::{Deserialize, Serialize};

use crate::stats::binomial_std_error;

/// One estimated legal ratio for a class at a given sample size.
///
/// Observations are append-only: a class gains a new row for every sample
/// size attempted and existing rows are never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleObservation {
    #[serde(rename = "id")]
    pub class_id: u64,
    pub sample_size: u64,
    pub legal_ratio: f64,
    pub std_error: f64,
}

impl SampleObservation {
    /// Builds the observation from raw counts.
    pub fn from_tally(class_id: u64, tally: &SampleTally) -> Self {
        let sample_size = tally.total();
        let legal_ratio = if sample_size == 0 {
            0.0
        } else {
            tally.legal as f64 / sample_size as f64
        };
        Self {
            class_id,
            sample_size,
            legal_ratio,
            std_error: binomial_std_error(legal_ratio, sample_size),
        }
    }

    /// Relative standard error; `1.0` when no legal sample was seen.
    pub fn rel_std(&self) -> f64 {
        if self.legal_ratio > 0.0 {
            self.std_error / self.legal_ratio
        } else {
            1.0
        }
    }

    /// Deduplication key.
    pub fn key(&self) -> (u64, u64) {
        (self.class_id, self.sample_size)
    }
}

/// Counts gathered while drawing one batch of occupancies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleTally {
    /// Occupancies accepted by the rule engine.
    pub legal: u64,
    /// Occupancies rejected by the rule engine.
    pub illegal: u64,
    /// Occupancies that could not be judged; counted as not legal.
    pub failed: u64,
}

impl SampleTally {
    pub fn total(&self) -> u64 {
        self.legal + self.illegal + self.failed
    }

    pub fn merge(&mut self, other: &SampleTally) {
        self.legal += other.legal;
        self.illegal += other.illegal;
        self.failed += other.failed;
    }
}

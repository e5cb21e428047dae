//! Per-class sampling scope.

use std::time::{Duration, Instant};

use crate::observation::{SampleObservation, SampleTally};

/// State of one class's adaptive sampling run.
///
/// Holds every observation known for the class (prior ones first, in table
/// order) so that stopping rules see the same history on a resumed run as on
/// an uninterrupted one.
#[derive(Debug)]
pub struct ClassScope {
    class_id: u64,
    observations: Vec<SampleObservation>,
    start_time: Instant,
    rounds: usize,
    tally: SampleTally,
}

impl ClassScope {
    /// Creates a scope seeded with prior observations of this class.
    ///
    /// Observations for other classes or with a zero sample size are ignored.
    pub fn new(class_id: u64, prior: impl IntoIterator<Item = SampleObservation>) -> Self {
        let observations = prior
            .into_iter()
            .filter(|o| o.class_id == class_id && o.sample_size > 0)
            .collect();
        Self {
            class_id,
            observations,
            start_time: Instant::now(),
            rounds: 0,
            tally: SampleTally::default(),
        }
    }

    pub fn class_id(&self) -> u64 {
        self.class_id
    }

    pub fn observations(&self) -> &[SampleObservation] {
        &self.observations
    }

    pub fn contains(&self, sample_size: u64) -> bool {
        self.observations.iter().any(|o| o.sample_size == sample_size)
    }

    /// The observation with the largest sample size, first recorded on ties.
    pub fn largest(&self) -> Option<&SampleObservation> {
        self.observations
            .iter()
            .rev()
            .max_by_key(|o| o.sample_size)
    }

    /// The two largest observations by sample size, largest first.
    pub fn two_largest(&self) -> Option<(&SampleObservation, &SampleObservation)> {
        let mut sorted: Vec<&SampleObservation> = self.observations.iter().collect();
        sorted.sort_by(|a, b| b.sample_size.cmp(&a.sample_size));
        match sorted.as_slice() {
            [first, second, ..] => Some((first, second)),
            _ => None,
        }
    }

    pub fn record(&mut self, observation: SampleObservation, tally: &SampleTally) {
        self.observations.push(observation);
        self.rounds += 1;
        self.tally.merge(tally);
    }

    /// Sample sizes drawn in this run (not counting prior observations).
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Counts accumulated in this run.
    pub fn tally(&self) -> &SampleTally {
        &self.tally
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: Duration) {
        if let Some(earlier) = self.start_time.checked_sub(by) {
            self.start_time = earlier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(class_id: u64, sample_size: u64, legal_ratio: f64) -> SampleObservation {
        SampleObservation {
            class_id,
            sample_size,
            legal_ratio,
            std_error: 0.0,
        }
    }

    #[test]
    fn test_prior_filtered_to_class() {
        let scope = ClassScope::new(1, [obs(1, 1000, 0.5), obs(2, 1000, 0.1), obs(1, 0, 0.9)]);
        assert_eq!(scope.observations().len(), 1);
        assert!(scope.contains(1000));
        assert!(!scope.contains(2000));
        assert_eq!(scope.rounds(), 0);
    }

    #[test]
    fn test_largest_prefers_first_recorded_on_ties() {
        let scope = ClassScope::new(1, [obs(1, 2000, 0.4), obs(1, 1000, 0.5), obs(1, 2000, 0.3)]);
        assert_eq!(scope.largest().unwrap().legal_ratio, 0.4);
    }

    #[test]
    fn test_two_largest() {
        let scope = ClassScope::new(1, [obs(1, 1000, 0.5), obs(1, 4000, 0.45), obs(1, 2000, 0.48)]);
        let (a, b) = scope.two_largest().unwrap();
        assert_eq!(a.sample_size, 4000);
        assert_eq!(b.sample_size, 2000);

        assert!(ClassScope::new(1, [obs(1, 1000, 0.5)]).two_largest().is_none());
    }
}

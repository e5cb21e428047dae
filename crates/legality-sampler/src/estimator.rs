//! Adaptive Monte-Carlo estimation of a class's legal ratio.

use std::time::Instant;

use legality_config::SamplingConfig;
use legality_core::{BoardSynthesizer, MaterialClass, RuleEngine, ShakmatyOracle, ValidityOracle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::observation::{SampleObservation, SampleTally};
use crate::scope::ClassScope;
use crate::termination::{class_termination, Termination, TimeTermination};

/// Draws random occupancies for a class and records one observation per
/// sample size until a stopping rule fires.
///
/// Sample sizes follow the configured initial sizes, then double (capped at
/// `max_sample`). Every initial size is always drawn; stopping rules apply
/// from then on.
#[derive(Debug)]
pub struct Estimator<O = ShakmatyOracle> {
    engine: RuleEngine<O>,
    synthesizer: BoardSynthesizer,
    config: SamplingConfig,
}

impl Default for Estimator<ShakmatyOracle> {
    fn default() -> Self {
        Self::new(RuleEngine::default(), SamplingConfig::default())
    }
}

impl<O: ValidityOracle> Estimator<O> {
    pub fn new(engine: RuleEngine<O>, config: SamplingConfig) -> Self {
        Self {
            engine,
            synthesizer: BoardSynthesizer::new(),
            config,
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn engine(&self) -> &RuleEngine<O> {
        &self.engine
    }

    /// Draws `n` occupancies and classifies each one.
    ///
    /// Oracle failures are tallied as `failed` and never count as legal.
    pub fn sample_once<R: Rng + ?Sized>(
        &self,
        class: &MaterialClass,
        n: u64,
        rng: &mut R,
    ) -> SampleTally {
        let tolerate = self.config.tolerate_backrank_pawns;
        let mut tally = SampleTally::default();
        for _ in 0..n {
            let placement = self.synthesizer.sample(&class.white, &class.black, rng);
            debug_assert_eq!(
                placement.truncated, 0,
                "class {} does not fit on the board",
                class.id
            );
            if placement.truncated > 0 {
                tally.failed += 1;
                continue;
            }
            match self.engine.is_legal(&placement.occupancy, tolerate) {
                Ok(true) => tally.legal += 1,
                Ok(false) => tally.illegal += 1,
                Err(err) => {
                    trace!(class_id = class.id, error = %err, "sample evaluation failed");
                    tally.failed += 1;
                }
            }
        }
        tally
    }

    /// Samples a class, skipping sizes already present in `prior`.
    ///
    /// Returns only the observations drawn in this call, in the order they
    /// were drawn. Prior observations still take part in stopping decisions.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        class: &MaterialClass,
        prior: &[SampleObservation],
        rng: &mut R,
    ) -> Vec<SampleObservation> {
        let mut scope = ClassScope::new(class.id, prior.iter().copied());
        let termination = class_termination(&self.config);
        let budget = self.config.class_time_limit().map(TimeTermination::new);
        let max_sample = self.config.max_sample;
        let mut drawn = Vec::new();

        for &size in &self.config.initial_sizes {
            let size = size.min(max_sample);
            if scope.contains(size) {
                continue;
            }
            if scope.rounds() > 0 && budget.is_terminated(&scope) {
                self.log_budget_exhausted(&scope);
                return drawn;
            }
            drawn.push(self.run_round(&mut scope, class, size, rng));
        }

        while !termination.is_terminated(&scope) {
            let Some(largest) = scope.largest() else {
                break;
            };
            let next = largest.sample_size.saturating_mul(2).min(max_sample);
            if scope.contains(next) {
                break;
            }
            drawn.push(self.run_round(&mut scope, class, next, rng));
        }

        if budget.is_terminated(&scope) {
            self.log_budget_exhausted(&scope);
        }
        debug!(
            event = "class_done",
            class_id = class.id,
            rounds = scope.rounds(),
            failed = scope.tally().failed,
            duration_ms = scope.elapsed().as_millis() as u64,
        );
        drawn
    }

    /// Samples a class with its own RNG derived from the configured seed.
    ///
    /// The ChaCha stream is the largest prior sample size, so a resumed class
    /// never replays the boards of an earlier run.
    pub fn estimate_class(
        &self,
        class: &MaterialClass,
        prior: &[SampleObservation],
    ) -> Vec<SampleObservation> {
        let mut rng = class_rng(self.config.random_seed, class.id);
        let resumed_from = prior
            .iter()
            .filter(|o| o.class_id == class.id)
            .map(|o| o.sample_size)
            .max()
            .unwrap_or(0);
        rng.set_stream(resumed_from);
        self.estimate(class, prior, &mut rng)
    }

    fn run_round<R: Rng + ?Sized>(
        &self,
        scope: &mut ClassScope,
        class: &MaterialClass,
        size: u64,
        rng: &mut R,
    ) -> SampleObservation {
        let started = Instant::now();
        let tally = self.sample_once(class, size, rng);
        let observation = SampleObservation::from_tally(class.id, &tally);

        info!(
            event = "class_sampled",
            class_id = class.id,
            sample_size = observation.sample_size,
            legal_ratio = observation.legal_ratio,
            std_error = observation.std_error,
            failed = tally.failed,
            duration_ms = started.elapsed().as_millis() as u64,
        );

        scope.record(observation, &tally);
        observation
    }

    fn log_budget_exhausted(&self, scope: &ClassScope) {
        debug!(
            event = "class_budget_exhausted",
            class_id = scope.class_id(),
            elapsed_ms = scope.elapsed().as_millis() as u64,
        );
    }
}

/// RNG for one class.
///
/// With a seed, each class gets its own deterministic stream regardless of
/// which shard or thread samples it. Without one, streams come from OS
/// entropy.
pub fn class_rng(seed: Option<u64>, class_id: u64) -> ChaCha8Rng {
    match seed {
        Some(seed) => {
            ChaCha8Rng::seed_from_u64(seed.wrapping_add(class_id.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
        }
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

#[cfg(test)]
#[path = "estimator_tests.rs"]
mod tests;

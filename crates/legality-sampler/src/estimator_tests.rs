use legality_config::{SamplingConfig, StoppingConfig};
use legality_core::RuleEngine;
use legality_test::{class, AlternatingOracle, FailingOracle, FlakyOracle, PermissiveOracle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::*;

fn small_config() -> SamplingConfig {
    SamplingConfig::new()
        .with_initial_sizes(vec![100, 200])
        .with_max_sample(128_000)
        .with_rel_std_threshold(0.04)
        .with_random_seed(7)
}

fn sizes(rows: &[SampleObservation]) -> Vec<u64> {
    rows.iter().map(|o| o.sample_size).collect()
}

#[test]
fn test_sample_once_counts_failures_separately() {
    let estimator = Estimator::new(RuleEngine::new(FlakyOracle::every(4)), small_config());
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let tally = estimator.sample_once(&class(1, "K1", "K1"), 100, &mut rng);
    assert_eq!(tally.total(), 100);
    assert_eq!(tally.failed, 25);
    assert_eq!(tally.legal, 75);
    assert_eq!(tally.illegal, 0);
}

#[test]
fn test_converged_class_stops_after_initial_sizes() {
    let estimator = Estimator::new(RuleEngine::new(PermissiveOracle), small_config());
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let rows = estimator.estimate(&class(1, "K1", "K1"), &[], &mut rng);
    assert_eq!(sizes(&rows), vec![100, 200]);
    assert!(rows.iter().all(|o| o.legal_ratio == 1.0 && o.std_error == 0.0));
    assert!(rows.iter().all(|o| o.class_id == 1));
}

#[test]
fn test_zero_ratio_doubles_until_max_sample() {
    let config = small_config().with_max_sample(800);
    let estimator = Estimator::new(RuleEngine::new(FailingOracle), config);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let rows = estimator.estimate(&class(1, "K1", "K1"), &[], &mut rng);
    assert_eq!(sizes(&rows), vec![100, 200, 400, 800]);
    assert!(rows.iter().all(|o| o.legal_ratio == 0.0));
}

#[test]
fn test_doubling_stops_when_relative_error_converges() {
    // Ratio is exactly 0.5: rel_std is 0.1, 0.071, 0.05, 0.035 for 100..800.
    let estimator = Estimator::new(RuleEngine::new(AlternatingOracle::every(2)), small_config());
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let rows = estimator.estimate(&class(1, "K1", "K1"), &[], &mut rng);
    assert_eq!(sizes(&rows), vec![100, 200, 400, 800]);
    for row in &rows {
        assert_eq!(row.legal_ratio, 0.5);
    }
    assert!(rows.last().unwrap().rel_std() < 0.04);
}

#[test]
fn test_resumption_skips_recorded_sizes() {
    let estimator = Estimator::new(RuleEngine::new(AlternatingOracle::every(2)), small_config());
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let prior: Vec<SampleObservation> = [100u64, 200]
        .into_iter()
        .map(|n| {
            let tally = SampleTally {
                legal: n / 2,
                illegal: n / 2,
                failed: 0,
            };
            SampleObservation::from_tally(1, &tally)
        })
        .collect();

    let rows = estimator.estimate(&class(1, "K1", "K1"), &prior, &mut rng);
    assert_eq!(sizes(&rows), vec![400, 800]);
}

#[test]
fn test_converged_prior_draws_nothing() {
    let estimator = Estimator::new(RuleEngine::new(FailingOracle), small_config());
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let prior = [100u64, 200].map(|n| SampleObservation {
        class_id: 1,
        sample_size: n,
        legal_ratio: 0.5,
        std_error: 0.001,
    });

    let rows = estimator.estimate(&class(1, "K1", "K1"), &prior, &mut rng);
    assert!(rows.is_empty());
}

#[test]
fn test_prior_of_other_classes_is_ignored() {
    let estimator = Estimator::new(RuleEngine::new(PermissiveOracle), small_config());
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let prior = [SampleObservation {
        class_id: 2,
        sample_size: 100,
        legal_ratio: 1.0,
        std_error: 0.0,
    }];

    let rows = estimator.estimate(&class(1, "K1", "K1"), &prior, &mut rng);
    assert_eq!(sizes(&rows), vec![100, 200]);
}

#[test]
fn test_initial_sizes_capped_at_max_sample() {
    let config = small_config()
        .with_initial_sizes(vec![1000, 2000])
        .with_max_sample(500);
    let estimator = Estimator::new(RuleEngine::new(FailingOracle), config);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let rows = estimator.estimate(&class(1, "K1", "K1"), &[], &mut rng);
    assert_eq!(sizes(&rows), vec![500]);
}

#[test]
fn test_relative_difference_variant() {
    let config = small_config().with_stopping(StoppingConfig::RelativeDifference {
        rel_threshold: 0.10,
        abs_threshold: 1e-6,
    });
    let estimator = Estimator::new(RuleEngine::new(AlternatingOracle::every(2)), config);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    // Both initial ratios are 0.5, so the two largest samples agree.
    let rows = estimator.estimate(&class(1, "K1", "K1"), &[], &mut rng);
    assert_eq!(sizes(&rows), vec![100, 200]);
}

#[test]
fn test_seeded_estimates_are_reproducible() {
    let config = small_config()
        .with_initial_sizes(vec![50, 100])
        .with_max_sample(200);
    let estimator = Estimator::new(RuleEngine::default(), config);
    let queen = class(3, "K1Q1", "K1");

    let first = estimator.estimate_class(&queen, &[]);
    let second = estimator.estimate_class(&queen, &[]);
    assert_eq!(first, second);

    for row in &first {
        assert!((0.0..=1.0).contains(&row.legal_ratio));
        assert!(row.std_error <= 0.5 / (row.sample_size as f64).sqrt() + 1e-12);
    }
}

#[test]
fn test_class_rng_streams() {
    let mut a = class_rng(Some(42), 1);
    let mut b = class_rng(Some(42), 1);
    let mut c = class_rng(Some(42), 2);

    let xa: u64 = a.random();
    let xb: u64 = b.random();
    let xc: u64 = c.random();
    assert_eq!(xa, xb);
    assert_ne!(xa, xc);
}

//! Numeric helpers for estimation and aggregation.
//!
//! - Binomial standard error of a proportion
//! - Neumaier compensated summation, for totals whose terms span dozens of
//!   orders of magnitude
//! - Lossy conversion of exact diagram counts to `f64`

use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// `sqrt(p * (1 - p) / n)`; zero for an empty sample.
pub fn binomial_std_error(p: f64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let variance = (p * (1.0 - p)).max(0.0) / n as f64;
    variance.sqrt()
}

/// Running sum with Neumaier (improved Kahan-Babuska) compensation.
///
/// ```
/// use legality_sampler::stats::NeumaierSum;
///
/// let mut sum = NeumaierSum::new();
/// for x in [1e100, 1.0, -1e100] {
///     sum.add(x);
/// }
/// assert_eq!(sum.total(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for NeumaierSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

/// Compensated sum of an iterator of floats.
pub fn compensated_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = NeumaierSum::new();
    sum.extend(values);
    sum.total()
}

/// Nearest `f64` to an exact count; infinity beyond the `f64` range.
pub fn biguint_to_f64(value: &BigUint) -> f64 {
    value.to_f64().unwrap_or(f64::INFINITY)
}

/// `numerator / denominator`, or NaN when the denominator is zero.
pub fn ratio_or_nan(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn test_binomial_std_error_bound() {
        for n in [1u64, 10, 1000, 128_000] {
            for i in 0..=20 {
                let p = f64::from(i) / 20.0;
                let se = binomial_std_error(p, n);
                assert!(se >= 0.0);
                assert!(se <= 0.5 / (n as f64).sqrt() + 1e-15);
            }
        }
        assert_eq!(binomial_std_error(0.5, 0), 0.0);
    }

    #[test]
    fn test_compensated_sum_recovers_cancelled_terms() {
        let naive: f64 = [1e100, 1.0, -1e100].iter().sum();
        assert_eq!(naive, 0.0);
        assert_eq!(compensated_sum([1e100, 1.0, -1e100]), 1.0);
    }

    #[test]
    fn test_compensated_sum_matches_exact_reference_across_magnitudes() {
        // Terms from 1 to 10^54, many small ones after each big one.
        let mut exact = BigUint::ZERO;
        let mut floats = Vec::new();
        let mut term = BigUint::one();
        for exponent in 0..=54u32 {
            for k in 1..=50u32 {
                let value = &term * k + BigUint::from(exponent);
                floats.push(biguint_to_f64(&value));
                exact += &value;
            }
            term *= 10u32;
            for small in 1..=100u32 {
                floats.push(f64::from(small));
                exact += BigUint::from(small);
            }
        }

        let reference = biguint_to_f64(&exact);
        let total = compensated_sum(floats.iter().copied());
        let relative = ((total - reference) / reference).abs();
        assert!(relative <= 4.0 * f64::EPSILON, "relative error {relative:e}");
    }

    #[test]
    fn test_ratio_or_nan() {
        assert!(ratio_or_nan(1.0, 0.0).is_nan());
        assert_eq!(ratio_or_nan(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_biguint_to_f64() {
        let big = BigUint::from(10u32).pow(54);
        assert!((biguint_to_f64(&big) - 1e54).abs() / 1e54 < f64::EPSILON);
    }
}

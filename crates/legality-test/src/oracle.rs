//! Deterministic validity oracles.
//!
//! Each oracle ignores the board (except [`FlakyOracle`], which counts calls)
//! so that estimator and shard tests can force a known legal ratio or a known
//! failure pattern.
//!
//! # Example
//!
//! ```
//! use legality_core::{Occupancy, ValidityOracle, Violations};
//! use legality_test::oracle::{FlagOracle, FlakyOracle};
//!
//! let flagged = FlagOracle(Violations::MISSING_KING);
//! assert_eq!(flagged.violations(&Occupancy::empty()).unwrap(), Violations::MISSING_KING);
//!
//! let flaky = FlakyOracle::every(2);
//! assert!(flaky.violations(&Occupancy::empty()).is_ok());
//! assert!(flaky.violations(&Occupancy::empty()).is_err());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use legality_core::{Occupancy, OracleError, ValidityOracle, Violations};

/// Reports every occupancy as valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveOracle;

impl ValidityOracle for PermissiveOracle {
    fn violations(&self, _: &Occupancy) -> Result<Violations, OracleError> {
        Ok(Violations::empty())
    }
}

/// Reports the same violations for every occupancy.
#[derive(Debug, Clone, Copy)]
pub struct FlagOracle(pub Violations);

impl ValidityOracle for FlagOracle {
    fn violations(&self, _: &Occupancy) -> Result<Violations, OracleError> {
        Ok(self.0)
    }
}

/// Fails on every occupancy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingOracle;

impl ValidityOracle for FailingOracle {
    fn violations(&self, _: &Occupancy) -> Result<Violations, OracleError> {
        Err(OracleError("oracle unavailable".into()))
    }
}

/// Fails on every `n`-th call and reports valid otherwise.
#[derive(Debug)]
pub struct FlakyOracle {
    period: u64,
    calls: AtomicU64,
}

impl FlakyOracle {
    pub fn every(period: u64) -> Self {
        Self {
            period: period.max(1),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ValidityOracle for FlakyOracle {
    fn violations(&self, _: &Occupancy) -> Result<Violations, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if call % self.period == 0 {
            Err(OracleError(format!("flaky failure on call {call}")))
        } else {
            Ok(Violations::empty())
        }
    }
}

/// Flags every `n`-th call with a missing king and reports valid otherwise,
/// giving an exact legal ratio of `1 - 1/n` per thread.
#[derive(Debug)]
pub struct AlternatingOracle {
    period: u64,
    calls: AtomicU64,
}

impl AlternatingOracle {
    pub fn every(period: u64) -> Self {
        Self {
            period: period.max(1),
            calls: AtomicU64::new(0),
        }
    }
}

impl ValidityOracle for AlternatingOracle {
    fn violations(&self, _: &Occupancy) -> Result<Violations, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if call % self.period == 0 {
            Ok(Violations::MISSING_KING)
        } else {
            Ok(Violations::empty())
        }
    }
}

/// Panics on every occupancy; used to exercise shard isolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingOracle;

impl ValidityOracle for PanickingOracle {
    fn violations(&self, _: &Occupancy) -> Result<Violations, OracleError> {
        panic!("oracle crashed")
    }
}

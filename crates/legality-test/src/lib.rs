//! Shared test fixtures for legality crates.
//!
//! This crate provides stub oracles and board builders for testing.
//! It depends only on `legality-core` so any crate may take it as a
//! dev-dependency.
//!
//! - [`oracle`] - Deterministic validity oracles (permissive, flagging, failing)
//! - [`board`] - Occupancy, material and class builders
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! legality-test = { workspace = true }
//! ```
//!
//! ```
//! use legality_core::RuleEngine;
//! use legality_test::board::occupancy;
//! use legality_test::oracle::PermissiveOracle;
//!
//! let engine = RuleEngine::new(PermissiveOracle);
//! let board = occupancy(&[("e1", 'K'), ("e8", 'k')]);
//! assert!(engine.is_legal(&board, true).unwrap());
//! ```

pub mod board;
pub mod oracle;

pub use board::{class, material, occupancy};
pub use oracle::{
    AlternatingOracle, FailingOracle, FlagOracle, FlakyOracle, PanickingOracle, PermissiveOracle,
};

//! Legality Core - material, boards, combinatorics and legality rules
//!
//! This crate provides the leaf components of the legality estimator:
//! - Per-side material records and material classes
//! - Exact diagram counting with arbitrary-precision integers
//! - Canonical, lazy enumeration of material classes
//! - Uniform random board placement
//! - The validity oracle seam and the rule engine built on it

pub mod board;
pub mod class;
pub mod combinatorics;
pub mod enumerate;
pub mod error;
pub mod material;
pub mod oracle;
pub mod rules;
pub mod square;

#[cfg(test)]
mod test_utils;

pub use board::{BoardSynthesizer, Occupancy, Piece, Placement};
pub use class::{MaterialClass, MAX_SIDE_PIECES, MAX_TOTAL_PIECES};
pub use combinatorics::{count_diagrams, factorial, falling_factorial};
pub use enumerate::{ClassEnumerator, ClassIter, Profile};
pub use error::LegalityError;
pub use material::{Material, MaterialParseError, PieceKind};
pub use oracle::{OracleError, ShakmatyOracle, ValidityOracle, Violations};
pub use rules::{Rejection, RuleEngine, Verdict, PAWN_FILE_CAP_STRICT, PAWN_FILE_CAP_TOLERANT};
pub use square::{Color, ParseSquareError, Square};

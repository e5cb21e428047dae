//! Legality rules layered on the validity oracle.
//!
//! Evaluation runs in a fixed order and stops at the first failure:
//!
//! 1. Oracle base invariants. With `tolerate_backrank_pawns` the
//!    pawns-on-back-rank flag is ignored; any other flag rejects.
//! 2. Pawn-per-file cap: at most [`PAWN_FILE_CAP_TOLERANT`] pawns of one color
//!    on a file when back-rank pawns are tolerated, [`PAWN_FILE_CAP_STRICT`]
//!    otherwise.
//! 3. Bishop square colors: two or more bishops of one color all on the same
//!    square color are only reachable through promotion. The check applies when
//!    back-rank pawns are tolerated, or when that color still has all 8 pawns.

use crate::board::Occupancy;
use crate::material::PieceKind;
use crate::oracle::{OracleError, ShakmatyOracle, ValidityOracle, Violations};
use crate::square::Color;

/// Pawns allowed on one file when back-rank pawns are tolerated.
pub const PAWN_FILE_CAP_TOLERANT: usize = 6;

/// Pawns allowed on one file otherwise.
pub const PAWN_FILE_CAP_STRICT: usize = 5;

const FULL_PAWN_COUNT: usize = 8;

/// Why an occupancy was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The oracle reported these base violations.
    Oracle(Violations),
    /// Too many pawns of one color on a single file.
    PawnFileOverflow { color: Color, file: u8, count: usize },
    /// All bishops of one color stand on the same square color.
    MonochromeBishops { color: Color },
}

/// Outcome of evaluating one occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Legal,
    Illegal(Rejection),
}

impl Verdict {
    pub fn is_legal(&self) -> bool {
        matches!(self, Verdict::Legal)
    }
}

/// Classifies occupancies as legal or illegal.
#[derive(Debug, Clone)]
pub struct RuleEngine<O = ShakmatyOracle> {
    oracle: O,
}

impl Default for RuleEngine<ShakmatyOracle> {
    fn default() -> Self {
        Self::new(ShakmatyOracle)
    }
}

impl<O: ValidityOracle> RuleEngine<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Evaluates all rules and names the first one violated.
    pub fn evaluate(
        &self,
        occupancy: &Occupancy,
        tolerate_backrank_pawns: bool,
    ) -> Result<Verdict, OracleError> {
        let mut violations = self.oracle.violations(occupancy)?;
        if tolerate_backrank_pawns {
            violations.remove(Violations::PAWNS_ON_BACKRANK);
        }
        if !violations.is_empty() {
            return Ok(Verdict::Illegal(Rejection::Oracle(violations)));
        }

        let cap = if tolerate_backrank_pawns {
            PAWN_FILE_CAP_TOLERANT
        } else {
            PAWN_FILE_CAP_STRICT
        };
        for color in Color::ALL {
            if let Some((file, count)) = pawn_file_overflow(occupancy, color, cap) {
                return Ok(Verdict::Illegal(Rejection::PawnFileOverflow { color, file, count }));
            }
        }

        for color in Color::ALL {
            let applies = tolerate_backrank_pawns
                || occupancy.count(color, PieceKind::Pawn) == FULL_PAWN_COUNT;
            if applies && monochrome_bishops(occupancy, color) {
                return Ok(Verdict::Illegal(Rejection::MonochromeBishops { color }));
            }
        }

        Ok(Verdict::Legal)
    }

    pub fn is_legal(
        &self,
        occupancy: &Occupancy,
        tolerate_backrank_pawns: bool,
    ) -> Result<bool, OracleError> {
        self.evaluate(occupancy, tolerate_backrank_pawns)
            .map(|verdict| verdict.is_legal())
    }
}

/// First file holding more than `cap` pawns of `color`, with its pawn count.
pub fn pawn_file_overflow(occupancy: &Occupancy, color: Color, cap: usize) -> Option<(u8, usize)> {
    let mut per_file = [0usize; 8];
    for square in occupancy.squares_of(color, PieceKind::Pawn) {
        per_file[usize::from(square.file())] += 1;
    }
    per_file
        .iter()
        .enumerate()
        .find(|&(_, &count)| count > cap)
        .map(|(file, &count)| (file as u8, count))
}

/// True when `color` has at least two bishops and all share one square color.
pub fn monochrome_bishops(occupancy: &Occupancy, color: Color) -> bool {
    let mut parities = occupancy
        .squares_of(color, PieceKind::Bishop)
        .map(|square| square.parity());
    let Some(first) = parities.next() else {
        return false;
    };
    let mut count = 1;
    for parity in parities {
        if parity != first {
            return false;
        }
        count += 1;
    }
    count >= 2
}

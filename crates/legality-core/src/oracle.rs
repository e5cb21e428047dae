//! Base-legality oracle.
//!
//! The rule engine does not reimplement chess position validation. It asks a
//! [`ValidityOracle`] which base invariants an occupancy violates and layers
//! its own heuristics on top. [`ShakmatyOracle`] is the production oracle,
//! built on `shakmaty`'s setup validation with White to move and no castling
//! or en passant rights.
//!
//! `shakmaty` also counts surplus pieces as promotions and rejects setups that
//! would need more promotions than missing pawns allow. That check is replaced
//! by the plain per-side limits (16 pieces, 8 pawns), so promoted material is
//! judged by the rule engine instead.

use std::fmt::Debug;

use bitflags::bitflags;
use shakmaty::{CastlingMode, Chess, FromSetup, PositionErrorKinds, Role, Setup};
use thiserror::Error;

use crate::board::{Occupancy, Piece};
use crate::class::MAX_SIDE_PIECES;
use crate::material::PieceKind;
use crate::square::{Color, Square};

bitflags! {
    /// Base invariants an occupancy can violate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Violations: u32 {
        const EMPTY_BOARD = 1 << 0;
        const MISSING_KING = 1 << 1;
        const TOO_MANY_KINGS = 1 << 2;
        const PAWNS_ON_BACKRANK = 1 << 3;
        /// More than 16 pieces or more than 8 pawns on one side.
        const TOO_MUCH_MATERIAL = 1 << 4;
        /// The side not to move is in check.
        const OPPOSITE_CHECK = 1 << 5;
        /// The check configuration cannot arise from a legal move.
        const IMPOSSIBLE_CHECK = 1 << 6;
        /// Castling, en passant or variant problems.
        const OTHER = 1 << 7;
    }
}

/// The oracle could not judge an occupancy at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validity oracle failed: {0}")]
pub struct OracleError(pub String);

/// Reports which base invariants an occupancy violates.
pub trait ValidityOracle: Send + Sync + Debug {
    /// Returns the violated invariants; empty means valid.
    fn violations(&self, occupancy: &Occupancy) -> Result<Violations, OracleError>;
}

impl<O: ValidityOracle + ?Sized> ValidityOracle for &O {
    fn violations(&self, occupancy: &Occupancy) -> Result<Violations, OracleError> {
        (**self).violations(occupancy)
    }
}

/// Oracle backed by `shakmaty` position validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl ShakmatyOracle {
    pub fn new() -> Self {
        Self
    }
}

impl ValidityOracle for ShakmatyOracle {
    fn violations(&self, occupancy: &Occupancy) -> Result<Violations, OracleError> {
        let mut setup = Setup::empty();
        for (square, piece) in occupancy.iter() {
            setup.board.set_piece_at(to_shakmaty_square(square), to_shakmaty_piece(piece));
        }

        let base = match Chess::from_setup(setup, CastlingMode::Standard) {
            Ok(_) => Violations::empty(),
            Err(err) => {
                violations_from_kinds(err.kinds().difference(PositionErrorKinds::TOO_MUCH_MATERIAL))
            }
        };
        Ok(base | excess_material(occupancy))
    }
}

const MAX_SIDE_PAWNS: usize = 8;

/// Flags a side with more than 16 pieces or more than 8 pawns.
pub fn excess_material(occupancy: &Occupancy) -> Violations {
    let mut pieces = [0usize; 2];
    let mut pawns = [0usize; 2];
    for (_, piece) in occupancy.iter() {
        let side = piece.color.index();
        pieces[side] += 1;
        if piece.kind == PieceKind::Pawn {
            pawns[side] += 1;
        }
    }
    if pieces.iter().any(|&n| n > MAX_SIDE_PIECES as usize) || pawns.iter().any(|&n| n > MAX_SIDE_PAWNS) {
        Violations::TOO_MUCH_MATERIAL
    } else {
        Violations::empty()
    }
}

fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(square.index()))
}

fn to_shakmaty_piece(piece: Piece) -> shakmaty::Piece {
    let color = match piece.color {
        Color::White => shakmaty::Color::White,
        Color::Black => shakmaty::Color::Black,
    };
    let role = match piece.kind {
        PieceKind::King => Role::King,
        PieceKind::Queen => Role::Queen,
        PieceKind::Rook => Role::Rook,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Knight => Role::Knight,
        PieceKind::Pawn => Role::Pawn,
    };
    shakmaty::Piece { color, role }
}

fn violations_from_kinds(kinds: PositionErrorKinds) -> Violations {
    const MAPPING: [(PositionErrorKinds, Violations); 10] = [
        (PositionErrorKinds::EMPTY_BOARD, Violations::EMPTY_BOARD),
        (PositionErrorKinds::MISSING_KING, Violations::MISSING_KING),
        (PositionErrorKinds::TOO_MANY_KINGS, Violations::TOO_MANY_KINGS),
        (PositionErrorKinds::PAWNS_ON_BACKRANK, Violations::PAWNS_ON_BACKRANK),
        (PositionErrorKinds::TOO_MUCH_MATERIAL, Violations::TOO_MUCH_MATERIAL),
        (PositionErrorKinds::OPPOSITE_CHECK, Violations::OPPOSITE_CHECK),
        (PositionErrorKinds::IMPOSSIBLE_CHECK, Violations::IMPOSSIBLE_CHECK),
        (PositionErrorKinds::INVALID_CASTLING_RIGHTS, Violations::OTHER),
        (PositionErrorKinds::INVALID_EP_SQUARE, Violations::OTHER),
        (PositionErrorKinds::VARIANT, Violations::OTHER),
    ];

    MAPPING
        .iter()
        .filter(|(kind, _)| kinds.contains(*kind))
        .fold(Violations::empty(), |acc, (_, v)| acc | *v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::board;

    #[test]
    fn test_kings_only_is_valid() {
        let occ = board(&[("e1", 'K'), ("e8", 'k')]);
        assert!(ShakmatyOracle.violations(&occ).unwrap().is_empty());
    }

    #[test]
    fn test_missing_and_extra_kings() {
        let occ = board(&[("e1", 'K')]);
        assert!(ShakmatyOracle.violations(&occ).unwrap().contains(Violations::MISSING_KING));

        let occ = board(&[("e1", 'K'), ("a1", 'K'), ("e8", 'k')]);
        assert!(ShakmatyOracle.violations(&occ).unwrap().contains(Violations::TOO_MANY_KINGS));
    }

    #[test]
    fn test_empty_board() {
        let v = ShakmatyOracle.violations(&Occupancy::empty()).unwrap();
        assert!(v.contains(Violations::EMPTY_BOARD));
    }

    #[test]
    fn test_backrank_pawn_flag() {
        let occ = board(&[("e1", 'K'), ("e8", 'k'), ("a8", 'P')]);
        let v = ShakmatyOracle.violations(&occ).unwrap();
        assert!(v.contains(Violations::PAWNS_ON_BACKRANK));
    }

    #[test]
    fn test_side_not_to_move_in_check() {
        // White to move while the black king stands in check from the rook.
        let occ = board(&[("a1", 'K'), ("e1", 'R'), ("e8", 'k')]);
        let v = ShakmatyOracle.violations(&occ).unwrap();
        assert!(v.contains(Violations::OPPOSITE_CHECK));
    }

    #[test]
    fn test_promoted_queens_with_full_pawn_set_are_valid() {
        let occ = board(&[
            ("e1", 'K'),
            ("e8", 'k'),
            ("a3", 'Q'),
            ("b3", 'Q'),
            ("a2", 'P'),
            ("b2", 'P'),
            ("c2", 'P'),
            ("d2", 'P'),
            ("e2", 'P'),
            ("f2", 'P'),
            ("g2", 'P'),
            ("h2", 'P'),
        ]);
        assert!(ShakmatyOracle.violations(&occ).unwrap().is_empty());
    }

    #[test]
    fn test_ninth_pawn_is_too_much_material() {
        let occ = board(&[
            ("e1", 'K'),
            ("e8", 'k'),
            ("a6", 'p'),
            ("a7", 'p'),
            ("b7", 'p'),
            ("c7", 'p'),
            ("d7", 'p'),
            ("e7", 'p'),
            ("f7", 'p'),
            ("g7", 'p'),
            ("h7", 'p'),
        ]);
        assert_eq!(excess_material(&occ), Violations::TOO_MUCH_MATERIAL);
        assert!(ShakmatyOracle.violations(&occ).unwrap().contains(Violations::TOO_MUCH_MATERIAL));
    }
}

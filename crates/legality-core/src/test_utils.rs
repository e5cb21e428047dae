//! Test utilities for legality-core

use crate::board::{Occupancy, Piece};
use crate::square::Square;

/// Builds an occupancy from `(square, fen letter)` pairs.
pub fn board(pieces: &[(&str, char)]) -> Occupancy {
    let mut occupancy = Occupancy::empty();
    for &(name, letter) in pieces {
        let square: Square = name.parse().unwrap();
        let piece = Piece::from_fen_char(letter).unwrap();
        assert!(occupancy.place(square, piece).is_none(), "{name} placed twice");
    }
    occupancy
}

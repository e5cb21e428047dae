//! Occupancy and material builders.

use legality_core::{Material, MaterialClass, Occupancy, Piece, Square};

/// Builds an occupancy from `(square, fen letter)` pairs.
///
/// # Panics
///
/// Panics on unknown squares or letters, or when a square is used twice.
pub fn occupancy(pieces: &[(&str, char)]) -> Occupancy {
    let mut board = Occupancy::empty();
    for &(name, letter) in pieces {
        let square: Square = name
            .parse()
            .unwrap_or_else(|e| panic!("bad square {name:?}: {e}"));
        let piece = Piece::from_fen_char(letter)
            .unwrap_or_else(|| panic!("bad piece letter {letter:?}"));
        assert!(board.place(square, piece).is_none(), "{name} used twice");
    }
    board
}

/// Parses a compact material code such as `K1Q1`.
///
/// # Panics
///
/// Panics when the code does not parse.
pub fn material(code: &str) -> Material {
    code.parse()
        .unwrap_or_else(|e| panic!("bad material code {code:?}: {e}"))
}

/// Builds a validated material class from compact codes.
///
/// # Panics
///
/// Panics when either code does not parse or the class is invalid.
pub fn class(id: u64, white: &str, black: &str) -> MaterialClass {
    MaterialClass::new(id, material(white), material(black))
        .unwrap_or_else(|e| panic!("bad class {white}/{black}: {e}"))
}

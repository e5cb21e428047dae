//! Square occupancies and uniform random placement.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::material::{Material, PieceKind};
use crate::square::{Color, Square};

/// A colored piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.code(),
            Color::Black => self.kind.code().to_ascii_lowercase(),
        }
    }

    pub fn from_fen_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_code(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self { color, kind })
    }
}

/// Assignment of pieces to squares; at most one piece per square.
#[derive(Clone, PartialEq, Eq)]
pub struct Occupancy {
    squares: [Option<Piece>; Square::COUNT],
}

impl Occupancy {
    pub fn empty() -> Self {
        Self {
            squares: [None; Square::COUNT],
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[usize::from(square.index())]
    }

    /// Places a piece, returning whatever occupied the square before.
    pub fn place(&mut self, square: Square, piece: Piece) -> Option<Piece> {
        self.squares[usize::from(square.index())].replace(piece)
    }

    /// Occupied squares with their pieces, a1 first.
    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Squares holding the given piece.
    pub fn squares_of(&self, color: Color, kind: PieceKind) -> impl Iterator<Item = Square> + '_ {
        let wanted = Piece::new(color, kind);
        self.iter().filter(move |&(_, p)| p == wanted).map(|(sq, _)| sq)
    }

    pub fn count(&self, color: Color, kind: PieceKind) -> usize {
        self.squares_of(color, kind).count()
    }

    pub fn len(&self) -> usize {
        self.squares.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Occupancy {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Occupancy {
    /// Renders the board placement field of a FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            let mut gap = 0;
            for file in 0..8 {
                match Square::from_coords(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => {
                        if gap > 0 {
                            write!(f, "{gap}")?;
                            gap = 0;
                        }
                        write!(f, "{}", piece.fen_char())?;
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                write!(f, "{gap}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }
        Ok(())
    }
}

/// Result of placing a material class on the board.
#[derive(Debug, Clone)]
pub struct Placement {
    pub occupancy: Occupancy,
    /// Pieces that did not fit because the board ran out of squares.
    pub truncated: u32,
}

/// Draws uniformly random occupancies for a material composition.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardSynthesizer;

impl BoardSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Places white then black pieces (K, Q, R, B, N, P order) on the head of
    /// a uniformly shuffled square list.
    ///
    /// Material larger than the board is placed until squares run out; the
    /// remainder is reported in [`Placement::truncated`]. Enumerated classes
    /// never exceed 32 pieces, so this only happens for hand-built material.
    pub fn sample<R: Rng + ?Sized>(&self, white: &Material, black: &Material, rng: &mut R) -> Placement {
        let mut squares: Vec<Square> = Square::all().collect();
        squares.shuffle(rng);
        let mut free = squares.into_iter();

        let mut occupancy = Occupancy::empty();
        let mut truncated = 0;
        for (color, material) in [(Color::White, white), (Color::Black, black)] {
            for (kind, count) in material.iter() {
                for _ in 0..count {
                    match free.next() {
                        Some(square) => {
                            occupancy.place(square, Piece::new(color, kind));
                        }
                        None => truncated += 1,
                    }
                }
            }
        }

        Placement {
            occupancy,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sample_places_every_piece_once() {
        let white = Material::king_only().with(PieceKind::Queen, 1);
        let black = Material::king_only().with(PieceKind::Rook, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            let placement = BoardSynthesizer::new().sample(&white, &black, &mut rng);
            assert_eq!(placement.truncated, 0);
            let board = placement.occupancy;
            assert_eq!(board.len(), 5);
            assert_eq!(board.count(Color::White, PieceKind::King), 1);
            assert_eq!(board.count(Color::White, PieceKind::Queen), 1);
            assert_eq!(board.count(Color::Black, PieceKind::King), 1);
            assert_eq!(board.count(Color::Black, PieceKind::Rook), 2);
        }
    }

    #[test]
    fn test_sample_is_deterministic_for_a_seed() {
        let white = Material::NO_PROMOTION_LIMITS;
        let black = Material::NO_PROMOTION_LIMITS;
        let a = BoardSynthesizer.sample(&white, &black, &mut ChaCha8Rng::seed_from_u64(42));
        let b = BoardSynthesizer.sample(&white, &black, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a.occupancy, b.occupancy);
        assert_eq!(a.occupancy.len(), 32);
    }

    #[test]
    fn test_sample_covers_all_squares() {
        let white = Material::king_only();
        let black = Material::king_only();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen = [false; 64];
        for _ in 0..2_000 {
            let board = BoardSynthesizer.sample(&white, &black, &mut rng).occupancy;
            for (sq, _) in board.iter() {
                seen[usize::from(sq.index())] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_oversized_material_is_truncated_not_overlapped() {
        let white = Material::king_only().with(PieceKind::Queen, 40);
        let black = Material::king_only().with(PieceKind::Pawn, 30);
        let placement = BoardSynthesizer.sample(&white, &black, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(placement.occupancy.len(), 64);
        assert_eq!(placement.truncated, 72 - 64);
        assert_eq!(placement.occupancy.count(Color::Black, PieceKind::Pawn), 30 - 8);
    }

    #[test]
    fn test_debug_renders_fen_board() {
        let mut board = Occupancy::empty();
        board.place("e1".parse().unwrap(), Piece::new(Color::White, PieceKind::King));
        board.place("e8".parse().unwrap(), Piece::new(Color::Black, PieceKind::King));
        assert_eq!(format!("{board:?}"), "4k3/8/8/8/8/8/8/4K3");
    }
}

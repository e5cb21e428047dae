//! Board squares and colors.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Side to which a piece belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// One of the 64 squares, indexed `rank * 8 + file` (a1 = 0, h8 = 63).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const COUNT: usize = 64;

    /// Returns the square with the given index, or `None` past h8.
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Self(index))
    }

    pub fn from_coords(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self(rank * 8 + file))
        } else {
            None
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// File 0..8, where 0 is the a-file.
    pub fn file(self) -> u8 {
        self.0 % 8
    }

    /// Rank 0..8, where 0 is the first rank.
    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    /// Square color as `(file + rank) mod 2`; 0 for dark squares such as a1.
    pub fn parity(self) -> u8 {
        (self.file() + self.rank()) % 2
    }

    pub fn is_back_rank(self) -> bool {
        self.rank() == 0 || self.rank() == 7
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::COUNT as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            char::from(b'a' + self.file()),
            char::from(b'1' + self.rank())
        )
    }
}

/// Error returned when a square name such as `e4` cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid square name: {0:?}")]
pub struct ParseSquareError(pub String);

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseSquareError(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::from_coords(file, rank).ok_or_else(|| ParseSquareError(s.to_string()))
    }
}

//! Per-side material inventories.
//!
//! A [`Material`] is a fixed-shape record with one count per piece type.
//! It serializes as a structured object keyed by piece code
//! (`{"K":1,"Q":0,...}`) and also parses from the compact form `K1Q1R2B2N2P8`,
//! which is how limits are written on the command line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The six chess piece types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Stable placement and display order.
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    pub fn code(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'K' => Some(PieceKind::King),
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

/// Piece counts for one side.
///
/// Field order drives the derived `Ord`, which the class enumerator uses as
/// its canonical tie-break (king, queen, rook, bishop, knight, pawn).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Material {
    #[serde(rename = "K")]
    pub king: u8,
    #[serde(rename = "Q", default)]
    pub queen: u8,
    #[serde(rename = "R", default)]
    pub rook: u8,
    #[serde(rename = "B", default)]
    pub bishop: u8,
    #[serde(rename = "N", default)]
    pub knight: u8,
    #[serde(rename = "P", default)]
    pub pawn: u8,
}

impl Material {
    /// Standard per-side limits without promotion: K1 Q1 R2 B2 N2 P8.
    pub const NO_PROMOTION_LIMITS: Material = Material {
        king: 1,
        queen: 1,
        rook: 2,
        bishop: 2,
        knight: 2,
        pawn: 8,
    };

    /// Theoretical per-side maxima reachable through promotion: K1 Q9 R10 B10 N10 P8.
    pub const PROMOTION_LIMITS: Material = Material {
        king: 1,
        queen: 9,
        rook: 10,
        bishop: 10,
        knight: 10,
        pawn: 8,
    };

    /// A lone king.
    pub fn king_only() -> Self {
        Self {
            king: 1,
            ..Self::default()
        }
    }

    pub fn count(&self, kind: PieceKind) -> u8 {
        match kind {
            PieceKind::King => self.king,
            PieceKind::Queen => self.queen,
            PieceKind::Rook => self.rook,
            PieceKind::Bishop => self.bishop,
            PieceKind::Knight => self.knight,
            PieceKind::Pawn => self.pawn,
        }
    }

    pub fn set(&mut self, kind: PieceKind, count: u8) {
        match kind {
            PieceKind::King => self.king = count,
            PieceKind::Queen => self.queen = count,
            PieceKind::Rook => self.rook = count,
            PieceKind::Bishop => self.bishop = count,
            PieceKind::Knight => self.knight = count,
            PieceKind::Pawn => self.pawn = count,
        }
    }

    pub fn with(mut self, kind: PieceKind, count: u8) -> Self {
        self.set(kind, count);
        self
    }

    /// Iterates `(kind, count)` in placement order, including zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (PieceKind, u8)> + '_ {
        PieceKind::ALL.iter().map(move |&kind| (kind, self.count(kind)))
    }

    pub fn total(&self) -> u32 {
        self.iter().map(|(_, c)| u32::from(c)).sum()
    }

    /// Returns true if every count is within the matching count of `limits`.
    pub fn within(&self, limits: &Material) -> bool {
        self.iter().all(|(kind, c)| c <= limits.count(kind))
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, count) in self.iter() {
            write!(f, "{}{}", kind.code(), count)?;
        }
        Ok(())
    }
}

/// Error returned when a compact material code cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterialParseError {
    #[error("unknown piece code {0:?}")]
    UnknownPiece(char),

    #[error("missing count after piece code {0:?}")]
    MissingCount(char),

    #[error("piece code {0:?} appears more than once")]
    Duplicate(char),

    #[error("count for piece code {0:?} is out of range")]
    Overflow(char),

    #[error("empty material code")]
    Empty,
}

impl FromStr for Material {
    type Err = MaterialParseError;

    /// Parses `K1Q1R2B2N2P8`. Missing piece codes count as zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MaterialParseError::Empty);
        }

        let mut material = Material::default();
        let mut seen = [false; 6];
        let mut chars = s.chars().peekable();

        while let Some(code) = chars.next() {
            let kind = PieceKind::from_code(code).ok_or(MaterialParseError::UnknownPiece(code))?;
            let slot = kind as usize;
            if seen[slot] {
                return Err(MaterialParseError::Duplicate(code));
            }
            seen[slot] = true;

            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            if digits.is_empty() {
                return Err(MaterialParseError::MissingCount(code));
            }
            let count: u8 = digits
                .parse()
                .map_err(|_| MaterialParseError::Overflow(code))?;
            material.set(kind, count);
        }

        Ok(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_roundtrip_of_limits() {
        let limits: Material = "K1Q1R2B2N2P8".parse().unwrap();
        assert_eq!(limits, Material::NO_PROMOTION_LIMITS);
        assert_eq!(limits.to_string(), "K1Q1R2B2N2P8");
    }

    #[test]
    fn test_compact_parse_multi_digit_and_missing() {
        let m: Material = "K1R10".parse().unwrap();
        assert_eq!(m.rook, 10);
        assert_eq!(m.queen, 0);
        assert_eq!(m.total(), 11);
    }

    #[test]
    fn test_compact_parse_errors() {
        assert_eq!("K1X2".parse::<Material>(), Err(MaterialParseError::UnknownPiece('X')));
        assert_eq!("KQ1".parse::<Material>(), Err(MaterialParseError::MissingCount('K')));
        assert_eq!("K1K1".parse::<Material>(), Err(MaterialParseError::Duplicate('K')));
        assert_eq!("K999".parse::<Material>(), Err(MaterialParseError::Overflow('K')));
        assert_eq!("  ".parse::<Material>(), Err(MaterialParseError::Empty));
    }

    #[test]
    fn test_structured_serialization() {
        let m = Material::king_only().with(PieceKind::Queen, 1);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"K":1,"Q":1,"R":0,"B":0,"N":0,"P":0}"#);

        let sparse: Material = serde_json::from_str(r#"{"K":1,"R":2}"#).unwrap();
        assert_eq!(sparse.rook, 2);

        assert!(serde_json::from_str::<Material>(r#"{"K":1,"X":2}"#).is_err());
        assert!(serde_json::from_str::<Material>(r#"{"Q":1}"#).is_err());
    }

    #[test]
    fn test_within_limits() {
        let m = Material::king_only().with(PieceKind::Queen, 2);
        assert!(!m.within(&Material::NO_PROMOTION_LIMITS));
        assert!(m.within(&Material::PROMOTION_LIMITS));
    }
}

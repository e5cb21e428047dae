//! Material classes: a white inventory paired with a black inventory.

use num_bigint::BigUint;

use crate::combinatorics::count_diagrams;
use crate::error::{LegalityError, Result};
use crate::material::Material;

/// Maximum pieces on the board across both sides.
pub const MAX_TOTAL_PIECES: u32 = 32;

/// Maximum pieces for one side.
pub const MAX_SIDE_PIECES: u32 = 16;

/// An immutable, validated pairing of white and black material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialClass {
    pub id: u64,
    pub white: Material,
    pub black: Material,
    pub total_pieces: u32,
    pub diagram_count: BigUint,
}

impl MaterialClass {
    /// Validates the material and computes its exact diagram count.
    pub fn new(id: u64, white: Material, black: Material) -> Result<Self> {
        let diagram_count = count_diagrams(&white, &black);
        Self::with_diagram_count(id, white, black, diagram_count)
    }

    /// Validates the material, taking the diagram count as given (e.g. from a
    /// stored table).
    pub fn with_diagram_count(
        id: u64,
        white: Material,
        black: Material,
        diagram_count: BigUint,
    ) -> Result<Self> {
        validate_side("white", &white)?;
        validate_side("black", &black)?;
        let total_pieces = white.total() + black.total();
        if total_pieces > MAX_TOTAL_PIECES {
            return Err(LegalityError::InvalidMaterial(format!(
                "class {id} has {total_pieces} pieces, more than {MAX_TOTAL_PIECES}"
            )));
        }
        Ok(Self {
            id,
            white,
            black,
            total_pieces,
            diagram_count,
        })
    }
}

fn validate_side(side: &str, material: &Material) -> Result<()> {
    if material.king != 1 {
        return Err(LegalityError::InvalidMaterial(format!(
            "{side} must have exactly one king, found {}",
            material.king
        )));
    }
    if material.total() > MAX_SIDE_PIECES {
        return Err(LegalityError::InvalidMaterial(format!(
            "{side} has {} pieces, more than {MAX_SIDE_PIECES}",
            material.total()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PieceKind;

    #[test]
    fn test_new_computes_diagram_count() {
        let white = Material::king_only().with(PieceKind::Queen, 1);
        let class = MaterialClass::new(7, white, Material::king_only()).unwrap();
        assert_eq!(class.total_pieces, 3);
        assert_eq!(class.diagram_count, BigUint::from(249_984u32));
    }

    #[test]
    fn test_rejects_missing_or_extra_king() {
        let no_king = Material::default().with(PieceKind::Queen, 1);
        assert!(MaterialClass::new(1, no_king, Material::king_only()).is_err());

        let two_kings = Material::king_only().with(PieceKind::King, 2);
        assert!(MaterialClass::new(1, Material::king_only(), two_kings).is_err());
    }

    #[test]
    fn test_rejects_overfull_side() {
        let crowded = Material::king_only().with(PieceKind::Pawn, 8).with(PieceKind::Queen, 9);
        let err = MaterialClass::new(1, crowded, Material::king_only()).unwrap_err();
        assert!(err.to_string().contains("more than 16"));
    }
}

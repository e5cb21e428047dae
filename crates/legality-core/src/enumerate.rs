//! Material class enumeration.
//!
//! Classes are produced lazily in canonical order: ascending total piece
//! count, then white material, then black material (both compared by the
//! derived `Ord` on [`Material`]). Ids start at 1 and depend only on the
//! limits and caps, so they are stable across runs.

use crate::class::{MaterialClass, MAX_SIDE_PIECES, MAX_TOTAL_PIECES};
use crate::combinatorics::count_diagrams;
use crate::material::Material;

/// Named limit profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// K1 Q1 R2 B2 N2 P8.
    NoPromotion,
    /// K1 Q9 R10 B10 N10 P8.
    PromotionExtended,
}

impl Profile {
    pub fn limits(self) -> Material {
        match self {
            Profile::NoPromotion => Material::NO_PROMOTION_LIMITS,
            Profile::PromotionExtended => Material::PROMOTION_LIMITS,
        }
    }
}

/// Generates every material class within per-piece limits and piece caps.
#[derive(Debug, Clone)]
pub struct ClassEnumerator {
    limits: Material,
    total_cap: u32,
    per_side_cap: u32,
}

impl ClassEnumerator {
    /// Creates an enumerator; the king limit is always fixed at one.
    pub fn new(limits: Material) -> Self {
        Self {
            limits: Material { king: 1, ..limits },
            total_cap: MAX_TOTAL_PIECES,
            per_side_cap: MAX_SIDE_PIECES,
        }
    }

    pub fn for_profile(profile: Profile) -> Self {
        Self::new(profile.limits())
    }

    /// Caps the combined piece count; values above 32 are clamped.
    pub fn with_total_cap(mut self, cap: u32) -> Self {
        self.total_cap = cap.min(MAX_TOTAL_PIECES);
        self
    }

    /// Caps each side's piece count; values above 16 are clamped.
    pub fn with_per_side_cap(mut self, cap: u32) -> Self {
        self.per_side_cap = cap.min(MAX_SIDE_PIECES);
        self
    }

    pub fn limits(&self) -> &Material {
        &self.limits
    }

    /// All single-side configurations in canonical order.
    pub fn side_materials(&self) -> Vec<Material> {
        let l = &self.limits;
        let mut sides = Vec::new();
        for queen in 0..=l.queen {
            for rook in 0..=l.rook {
                for bishop in 0..=l.bishop {
                    for knight in 0..=l.knight {
                        for pawn in 0..=l.pawn {
                            let side = Material {
                                king: 1,
                                queen,
                                rook,
                                bishop,
                                knight,
                                pawn,
                            };
                            if side.total() <= self.per_side_cap {
                                sides.push(side);
                            }
                        }
                    }
                }
            }
        }
        sides
    }

    /// Lazily yields classes in canonical order.
    pub fn iter(&self) -> ClassIter {
        let sides = self.side_materials();
        let mut by_total: Vec<Vec<usize>> = vec![Vec::new(); self.per_side_cap as usize + 1];
        for (index, side) in sides.iter().enumerate() {
            by_total[side.total() as usize].push(index);
        }
        ClassIter {
            sides,
            by_total,
            total: 0,
            max_total: self.total_cap,
            white: 0,
            black: 0,
            next_id: 1,
        }
    }

    /// Collects classes, stopping after `max_classes` when given.
    pub fn generate(&self, max_classes: Option<usize>) -> Vec<MaterialClass> {
        match max_classes {
            Some(max) => self.iter().take(max).collect(),
            None => self.iter().collect(),
        }
    }
}

/// Iterator over material classes; see [`ClassEnumerator::iter`].
#[derive(Debug)]
pub struct ClassIter {
    sides: Vec<Material>,
    by_total: Vec<Vec<usize>>,
    total: u32,
    max_total: u32,
    white: usize,
    black: usize,
    next_id: u64,
}

impl Iterator for ClassIter {
    type Item = MaterialClass;

    fn next(&mut self) -> Option<MaterialClass> {
        while self.total <= self.max_total {
            while self.white < self.sides.len() {
                let white = self.sides[self.white];
                let partner = self
                    .total
                    .checked_sub(white.total())
                    .and_then(|black_total| self.by_total.get(black_total as usize))
                    .and_then(|group| group.get(self.black));

                if let Some(&black_index) = partner {
                    self.black += 1;
                    let black = self.sides[black_index];
                    let id = self.next_id;
                    self.next_id += 1;
                    return Some(MaterialClass {
                        id,
                        white,
                        black,
                        total_pieces: self.total,
                        diagram_count: count_diagrams(&white, &black),
                    });
                }

                self.white += 1;
                self.black = 0;
            }
            self.total += 1;
            self.white = 0;
            self.black = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PieceKind;

    #[test]
    fn test_no_promotion_profile_size() {
        let enumerator = ClassEnumerator::for_profile(Profile::NoPromotion);
        assert_eq!(enumerator.side_materials().len(), 2 * 3 * 3 * 3 * 9);

        let classes = enumerator.generate(None);
        assert_eq!(classes.len(), 486 * 486);
        assert_eq!(classes.first().unwrap().id, 1);
        assert_eq!(classes.last().unwrap().id, 486 * 486);
    }

    #[test]
    fn test_class_invariants_hold() {
        let classes = ClassEnumerator::for_profile(Profile::NoPromotion).generate(Some(20_000));
        for class in &classes {
            assert!(class.total_pieces >= 2 && class.total_pieces <= 32);
            assert!(class.white.total() <= 16);
            assert!(class.black.total() <= 16);
            assert_eq!(class.white.king, 1);
            assert_eq!(class.black.king, 1);
            assert!(class.white.within(&Material::NO_PROMOTION_LIMITS));
            assert!(class.black.within(&Material::NO_PROMOTION_LIMITS));
            assert_eq!(class.total_pieces, class.white.total() + class.black.total());
        }
    }

    #[test]
    fn test_canonical_order() {
        let classes = ClassEnumerator::for_profile(Profile::NoPromotion).generate(Some(5_000));
        assert_eq!(classes[0].white, Material::king_only());
        assert_eq!(classes[0].black, Material::king_only());

        for pair in classes.windows(2) {
            let a = (pair[0].total_pieces, pair[0].white, pair[0].black);
            let b = (pair[1].total_pieces, pair[1].white, pair[1].black);
            assert!(a < b, "{a:?} should precede {b:?}");
            assert_eq!(pair[0].id + 1, pair[1].id);
        }
    }

    #[test]
    fn test_ids_are_reproducible() {
        let enumerator = ClassEnumerator::for_profile(Profile::NoPromotion);
        let first = enumerator.generate(Some(300));
        let second = enumerator.generate(Some(300));
        assert_eq!(first, second);
    }

    #[test]
    fn test_promotion_profile_is_lazy_and_capped() {
        let enumerator = ClassEnumerator::for_profile(Profile::PromotionExtended);
        let sides = enumerator.side_materials();
        assert!(sides.iter().all(|s| s.total() <= 16));
        assert!(sides.iter().any(|s| s.queen == 9));

        let classes = enumerator.generate(Some(1_000));
        assert_eq!(classes.len(), 1_000);
        assert!(classes.iter().all(|c| c.total_pieces <= 32));
    }

    #[test]
    fn test_total_cap_restricts_classes() {
        let enumerator = ClassEnumerator::for_profile(Profile::NoPromotion).with_total_cap(3);
        let classes = enumerator.generate(None);
        // K vs K, then one extra piece on either side.
        assert_eq!(classes.len(), 1 + 5 + 5);
        assert!(classes.iter().all(|c| c.total_pieces <= 3));
        assert!(classes
            .iter()
            .any(|c| c.white.count(PieceKind::Queen) == 1 && c.black == Material::king_only()));
    }

    #[test]
    fn test_per_side_cap() {
        let enumerator = ClassEnumerator::for_profile(Profile::NoPromotion).with_per_side_cap(2);
        let classes = enumerator.generate(None);
        assert_eq!(classes.len(), 6 * 6);
        assert!(classes.iter().all(|c| c.white.total() <= 2 && c.black.total() <= 2));
    }
}

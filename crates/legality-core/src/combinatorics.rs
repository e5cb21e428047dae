//! Exact diagram counting.
//!
//! A diagram is an assignment of a material class's pieces to distinct
//! squares. Counting treats every piece as distinguishable (a falling
//! factorial over the 64 squares) and then divides out the permutations of
//! interchangeable pieces of the same type and color.

use num_bigint::BigUint;
use num_traits::One;

use crate::material::Material;
use crate::square::Square;

/// `n * (n - 1) * ... * (n - k + 1)`; zero when `k > n`.
pub fn falling_factorial(n: u32, k: u32) -> BigUint {
    if k > n {
        return BigUint::ZERO;
    }
    ((n - k + 1)..=n).fold(BigUint::one(), |acc, x| acc * x)
}

/// `n!`
pub fn factorial(n: u32) -> BigUint {
    (2..=n).fold(BigUint::one(), |acc, x| acc * x)
}

/// Number of distinct square-occupancy diagrams for the given material.
pub fn count_diagrams(white: &Material, black: &Material) -> BigUint {
    let total = white.total() + black.total();
    let numerator = falling_factorial(Square::COUNT as u32, total);

    let denominator = [white, black]
        .into_iter()
        .flat_map(|side| side.iter())
        .filter(|&(_, count)| count > 1)
        .fold(BigUint::one(), |acc, (_, count)| acc * factorial(u32::from(count)));

    numerator / denominator
}

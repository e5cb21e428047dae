//! Error types for legality-core

use thiserror::Error;

/// Main error type for core legality operations
#[derive(Debug, Error)]
pub enum LegalityError {
    /// Material composition violates a class invariant
    #[error("Invalid material: {0}")]
    InvalidMaterial(String),
}

/// Result type alias for core legality operations
pub type Result<T> = std::result::Result<T, LegalityError>;

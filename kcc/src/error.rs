//! Error types for the character controller.

use thiserror::Error;

/// Rejected [`crate::CharacterConfig`] values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A field that must be finite held NaN or infinity.
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    /// A distance or offset that must be strictly positive.
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    /// A distance that must be non-negative.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// A value outside its allowed range.
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// The rigidbody contact buffer size is zero or larger than allowed.
    #[error("max_rigid_body_contacts must be within [1, {max}], got {value}")]
    ContactCapacity { value: usize, max: usize },
}

/// Reasons a character tick was skipped. The character state is left untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TickError {
    /// Sweep math assumes the collider is scaled uniformly.
    #[error("character world scale must be uniform, got {0:?}")]
    NonUniformScale([f32; 3]),

    /// The character has no controller to provide movement.
    #[error("character has no controller")]
    MissingController,
}

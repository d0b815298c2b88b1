//! Animation error types

use thiserror::Error;

/// Errors reported by the animation controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Duration must be a finite number of milliseconds greater than zero
    #[error("Invalid animation duration: {0}ms")]
    InvalidDuration(f64),

    /// `from` and `to` states track different keys
    #[error("State key mismatch: `{key}` is not present in both states")]
    KeyMismatch { key: String },

    /// A new target does not track the same keys as the animation in flight
    #[error("Tracked keys changed mid-animation: `{key}`")]
    TrackedKeysChanged { key: String },

    /// A state value is NaN or infinite
    #[error("Non-finite value for key `{key}`")]
    NonFiniteValue { key: String },

    /// Easing name is not one of the built-in curves
    #[error("Unknown easing function: {0}")]
    UnknownEasing(String),

    /// Controller settings could not be loaded
    #[error("Invalid controller settings: {0}")]
    InvalidSettings(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;

//! Core error types.

use crate::version::Stability;

/// Errors that can occur during fixture composition.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Package name does not follow the `vendor/name` form.
    #[error("invalid package name '{name}': expected 'vendor/name'")]
    InvalidPackageName { name: String },

    /// A core-matrix constraint failed to parse.
    #[error("invalid constraint '{constraint}' for '{context}': {detail}")]
    InvalidConstraint {
        context: String,
        constraint: String,
        detail: String,
    },

    /// A version string failed to parse.
    #[error("invalid version '{version}'")]
    InvalidVersion { version: String },

    /// A fixture option or option combination is invalid.
    #[error("invalid argument --{option}={value}: {reason}")]
    InvalidArgument {
        option: String,
        value: String,
        reason: String,
    },

    /// Requested package is not present in the registry.
    #[error("no such package: {name}")]
    NoSuchPackage { name: String },

    /// No release candidate satisfies the constraint at the given stability.
    #[error("no candidate for '{package}' matching '{constraint}' at {stability} stability")]
    NoCandidate {
        package: String,
        constraint: String,
        stability: Stability,
    },

    /// The current core version could not be resolved. Every other
    /// resolution strategy depends on it, so this is never recoverable.
    #[error("internal error: no stable core release found — 'current' must always resolve")]
    CurrentUnresolvable,

    /// Release feed error.
    #[error("release feed error: {detail}")]
    Feed { detail: String },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

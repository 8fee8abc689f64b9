//! Error types for decor-rs.
//!
//! Degraded tracking is deliberately absent: a tracking quality other than
//! normal is folded into the placement cursor state and never surfaces here.

use thiserror::Error;

/// The main error type for decor-rs operations.
#[derive(Error, Debug)]
pub enum DecorError {
    /// The device cannot run world tracking. Fatal at startup.
    #[error("world tracking is not supported on this device")]
    TrackingUnavailable,

    /// An asset failed to load. The object is marked failed and may be re-placed.
    #[error("failed to load asset '{asset}': {reason}")]
    LoadFailure { asset: String, reason: String },

    /// A session lifecycle action was requested from a state that does not allow it.
    #[error("cannot {action} a session that is {from}")]
    InvalidTransition { from: String, action: &'static str },

    /// Placement was requested while the cursor is not on a surface.
    #[error("no surface under the placement cursor")]
    NoPlacementSurface,

    /// Registration was attempted with an empty email or password.
    #[error("email and password are both required")]
    MissingCredentials,

    /// Login credentials do not match the registered account.
    #[error("email or password does not match")]
    InvalidCredentials,

    /// The scene mutation queue no longer accepts work.
    #[error("scene mutation queue has shut down")]
    QueueClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecorError {
    /// Builds a [`DecorError::LoadFailure`] for the given asset.
    pub fn load_failure(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailure {
            asset: asset.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the caller can recover by retrying the operation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::TrackingUnavailable | Self::QueueClosed)
    }
}

/// A specialized Result type for decor-rs operations.
pub type Result<T> = std::result::Result<T, DecorError>;

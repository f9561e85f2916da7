//! Error types for the room client

use thiserror::Error;

/// Result type for room client operations
pub type RoomResult<T> = Result<T, RoomError>;

/// Errors surfaced to callers of the room bootstrapper
///
/// Disconnect problems are deliberately absent: they are logged and emitted
/// as [`RoomClientEvent::Warning`](crate::events::RoomClientEvent::Warning)
/// instead of being returned.
#[derive(Debug, Error)]
pub enum RoomError {
    /// Bad or missing input, detected before any network activity
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The server URL could not be resolved
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Opening the session failed (network or auth)
    #[error("Failed to join room at {url}: {source}")]
    JoinFailure {
        url: String,
        #[source]
        source: SdkError,
    },

    /// Acquiring or publishing the local camera track failed
    #[error("Failed to publish local video: {source}")]
    PublishFailure {
        #[source]
        source: SdkError,
    },

    /// Operation not allowed in the current session state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

impl RoomError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a join failure for the given server URL
    pub fn join_failure(url: impl Into<String>, source: SdkError) -> Self {
        Self::JoinFailure {
            url: url.into(),
            source,
        }
    }

    /// Create a publish failure
    pub fn publish_failure(source: SdkError) -> Self {
        Self::PublishFailure { source }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// True for errors raised by input validation
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

/// Failures reported by the media-room SDK
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The user or platform denied device access
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No capture device could be opened
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The session is already closed
    #[error("session closed")]
    Closed,

    /// Anything else the SDK reports
    #[error("{0}")]
    Other(String),
}

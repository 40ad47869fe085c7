//! Error types for registry and forum operations.
//!
//! Every failing call aborts with one of these variants and leaves the
//! registry exactly as it was before the call.

use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Main error type for registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The name hash is already bound to an entity of the same kind.
    #[error("Name already taken: {0}")]
    NameTaken(String),

    /// The caller identity does not hold the role the operation requires.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No user is registered under the given name hash.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// No forum is registered under the given id or name hash.
    #[error("Unknown forum: {0}")]
    UnknownForum(String),

    /// The post id does not reference a post in this forum.
    #[error("Unknown post: {0}")]
    UnknownPost(String),

    /// The poster's reputation is strictly below the forum threshold.
    #[error("Reputation {reputation} is below forum threshold {threshold}")]
    BelowThreshold {
        /// Current reputation of the poster.
        reputation: i64,
        /// Threshold of the forum at the time of the call.
        threshold: i64,
    },

    /// Applying the delta would leave the signed 64-bit range.
    #[error("Reputation overflow: {current} + {delta}")]
    ReputationOverflow {
        /// Reputation before the adjustment.
        current: i64,
        /// Requested delta.
        delta: i64,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistent storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Creates a new name-taken error.
    pub fn name_taken<T: ToString>(msg: T) -> Self {
        Self::NameTaken(msg.to_string())
    }

    /// Creates a new unauthorized error.
    pub fn unauthorized<T: ToString>(msg: T) -> Self {
        Self::Unauthorized(msg.to_string())
    }

    /// Creates a new unknown-user error.
    pub fn unknown_user<T: ToString>(msg: T) -> Self {
        Self::UnknownUser(msg.to_string())
    }

    /// Creates a new unknown-forum error.
    pub fn unknown_forum<T: ToString>(msg: T) -> Self {
        Self::UnknownForum(msg.to_string())
    }

    /// Creates a new unknown-post error.
    pub fn unknown_post<T: ToString>(msg: T) -> Self {
        Self::UnknownPost(msg.to_string())
    }

    /// Creates a new validation error.
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Creates a new storage error.
    pub fn storage<T: ToString>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new configuration error.
    pub fn config<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Short, stable name of the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NameTaken(_) => "NameTaken",
            Self::Unauthorized(_) => "Unauthorized",
            Self::UnknownUser(_) => "UnknownUser",
            Self::UnknownForum(_) => "UnknownForum",
            Self::UnknownPost(_) => "UnknownPost",
            Self::BelowThreshold { .. } => "BelowThreshold",
            Self::ReputationOverflow { .. } => "ReputationOverflow",
            Self::Validation(_) => "Validation",
            Self::Storage(_) => "Storage",
            Self::Serialization(_) => "Serialization",
            Self::Config(_) => "Config",
            Self::Io(_) => "Io",
        }
    }
}

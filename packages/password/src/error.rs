//! Error handling for password hashing, verification and generation

use thiserror::Error;

/// Password-specific errors
///
/// A wrong password is never an error: verification mismatches surface as
/// `Ok(false)`. These variants cover precondition violations, stored hashes
/// that cannot be understood, and configurations the runtime cannot serve.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Null/empty password, negative length, non-positive cost and similar
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The encoded hash does not match any known grammar or failed to parse
    #[error("Malformed hash: {0}")]
    MalformedHash(String),

    /// Requested algorithm, variant or provider is not available
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
}

impl PasswordError {
    /// Create an `InvalidArgument` error
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a `MalformedHash` error
    #[must_use]
    pub fn malformed_hash(msg: impl Into<String>) -> Self {
        Self::MalformedHash(msg.into())
    }

    /// Create an `UnsupportedConfiguration` error
    #[must_use]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration(msg.into())
    }

    /// True for [`PasswordError::InvalidArgument`]
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// True for [`PasswordError::MalformedHash`]
    #[must_use]
    pub fn is_malformed_hash(&self) -> bool {
        matches!(self, Self::MalformedHash(_))
    }

    /// True for [`PasswordError::UnsupportedConfiguration`]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedConfiguration(_))
    }
}

/// Result type for password operations
pub type Result<T> = std::result::Result<T, PasswordError>;

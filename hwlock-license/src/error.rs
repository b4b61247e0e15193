//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Missing or incorrect admin credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Unknown token or license id.
    #[error("license not found: {0}")]
    NotFound(String),

    /// Another record already carries this token digest.
    #[error("duplicate token digest")]
    DuplicateToken,

    /// Token generation kept colliding with existing digests.
    #[error("token generation collided {0} times")]
    GenerationCollision(u32),

    /// License has expired.
    #[error("license expired on {0}")]
    Expired(String),

    /// License has been disabled by an administrator.
    #[error("license is inactive")]
    Inactive,

    /// License is bound to a different hardware id.
    #[error("license is bound to another device")]
    HwidMismatch,

    /// A required field is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Persistence backend failed or is unreachable.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Network error talking to the license server.
    #[error("network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns true for failures caused by the caller's input rather than the
    /// server's state.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::NotFound(_) | Self::Validation(_)
        )
    }
}

impl From<rusqlite::Error> for LicenseError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::DuplicateToken
            }
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound("no matching row".into()),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<std::io::Error> for LicenseError {
    fn from(err: std::io::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

//! Error types for nationalize operations

use thiserror::Error;

/// Persistent store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Person not found: {name}")]
    NotFound { name: String },

    #[error("Person already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Cache backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend failure: {reason}")]
    Backend { reason: String },

    #[error("Cache serialization failed for key {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Request validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate country_id in request: {country_id}")]
    DuplicateCountry { country_id: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors talking to the third-party nationality API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream responded with status {status}")]
    Status { status: u16 },

    #[error("Upstream request failed: {reason}")]
    Transport { reason: String },

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Invalid upstream response: {reason}")]
    InvalidResponse { reason: String },
}

/// Master error type for all nationalize errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NationalizeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl NationalizeError {
    /// Shorthand for the not-found storage error.
    pub fn not_found(name: impl Into<String>) -> Self {
        StorageError::NotFound { name: name.into() }.into()
    }
}

/// Result type alias for nationalize operations.
pub type NationalizeResult<T> = Result<T, NationalizeError>;

// =============================================================================
// TESTS
// =============================================================================

//! Error Types for the Nationalize API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.
//! `From<NationalizeError>` is the single translation point from domain
//! errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nationalize_core::{CacheError, NationalizeError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    // ========================================================================
    // Not Found / Conflict (404, 409)
    // ========================================================================
    /// No stored record for the requested name
    PersonNotFound,

    /// A record with the same name already exists
    PersonAlreadyExists,

    // ========================================================================
    // Upstream Errors (passthrough, 502, 504)
    // ========================================================================
    /// The nationality API answered with a non-success status
    UpstreamError,

    /// The nationality API could not be reached or sent garbage
    UpstreamUnavailable,

    /// The nationality API did not answer in time
    UpstreamTimeout,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Cache operation failed
    CacheError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    ///
    /// `UpstreamError` defaults to 502 here; the actual upstream status is
    /// carried on the [`ApiError`] itself.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::MissingField => StatusCode::BAD_REQUEST,

            ErrorCode::PersonNotFound => StatusCode::NOT_FOUND,

            ErrorCode::PersonAlreadyExists => StatusCode::CONFLICT,

            ErrorCode::UpstreamError | ErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,

            ErrorCode::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::InternalError | ErrorCode::DatabaseError | ErrorCode::CacheError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::PersonNotFound => "Record not found",
            ErrorCode::PersonAlreadyExists => "Record already exists",
            ErrorCode::UpstreamError => "External API request failed",
            ErrorCode::UpstreamUnavailable => "External API is unavailable",
            ErrorCode::UpstreamTimeout => "External API request timed out",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::CacheError => "Cache operation failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (offending field, upstream status)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,

    /// HTTP status overriding the code's default, used to pass upstream
    /// statuses through unchanged.
    #[serde(skip)]
    pub status: Option<u16>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or_else(|| self.code.status_code())
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn person_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::PersonNotFound,
            format!("No record for name '{}'", name),
        )
    }

    pub fn person_already_exists(name: &str) -> Self {
        Self::new(
            ErrorCode::PersonAlreadyExists,
            format!("A record for name '{}' already exists", name),
        )
    }

    /// Upstream answered with `status`; the response carries the same status.
    ///
    /// Statuses that are not valid HTTP codes fall back to 502.
    pub fn upstream_status(status: u16) -> Self {
        let mut err = Self::from_code(ErrorCode::UpstreamError)
            .with_details(serde_json::json!({ "upstream_status": status }));
        err.status = Some(status);
        err
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, message)
    }

    pub fn upstream_timeout() -> Self {
        Self::from_code(ErrorCode::UpstreamTimeout)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn cache_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CacheError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Implement IntoResponse for ApiError to enable automatic error handling in Axum.
///
/// ```ignore
/// async fn handler() -> Result<Json<PersonRecord>, ApiError> {
///     Err(ApiError::missing_field("name"))
/// }
/// ```
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(field),
            ValidationError::InvalidValue { field, .. } => ApiError::invalid_input(err.to_string())
                .with_details(serde_json::json!({ "field": field })),
            ValidationError::DuplicateCountry { country_id } => {
                ApiError::invalid_input(err.to_string())
                    .with_details(serde_json::json!({ "field": "country", "country_id": country_id }))
            }
        }
    }
}

impl From<NationalizeError> for ApiError {
    fn from(err: NationalizeError) -> Self {
        use nationalize_core::UpstreamError;

        match err {
            NationalizeError::Validation(e) => e.into(),

            NationalizeError::Storage(StorageError::NotFound { name }) => {
                ApiError::person_not_found(&name)
            }
            NationalizeError::Storage(StorageError::AlreadyExists { name }) => {
                ApiError::person_already_exists(&name)
            }
            NationalizeError::Storage(e) => {
                // Log the full error, return a generic message
                tracing::error!(error = %e, "Storage error");
                ApiError::from_code(ErrorCode::DatabaseError)
            }

            NationalizeError::Cache(e) => {
                tracing::error!(error = %e, "Cache error");
                match e {
                    CacheError::Serialization { .. } => {
                        ApiError::cache_error("Failed to encode cache entry")
                    }
                    _ => ApiError::from_code(ErrorCode::CacheError),
                }
            }

            NationalizeError::Upstream(UpstreamError::Status { status }) => {
                tracing::warn!(status, "Upstream returned non-success status");
                ApiError::upstream_status(status)
            }
            NationalizeError::Upstream(UpstreamError::Timeout) => ApiError::upstream_timeout(),
            NationalizeError::Upstream(e) => {
                tracing::error!(error = %e, "Upstream request failed");
                ApiError::upstream_unavailable(ErrorCode::UpstreamUnavailable.default_message())
            }
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

use thiserror::Error;

/// Classification shared by every component boundary.
///
/// Callers branch on the code rather than on error string contents; the
/// message carries the user-facing copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed input; `field` names the offending field when known.
    Validation,
    /// Entity absent, or present but not owned by the caller.
    NotFound,
    /// Unique-constraint collision; retryable by re-running the operation.
    Conflict,
    /// Storefront/catalog 5xx or network failure.
    ExternalServiceUnavailable,
    /// Storefront/catalog 429.
    RateLimited,
    /// Storefront profile visibility check failed.
    ProfilePrivate,
    /// Persistence failure not otherwise classified.
    Database,
    /// Unexpected failure.
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Validation => "validation_error",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::ExternalServiceUnavailable => "external_service_unavailable",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::ProfilePrivate => "profile_private",
            ErrorCode::Database => "database_error",
            ErrorCode::Internal => "internal_error",
        }
    }
}

/// Tagged error returned across component boundaries.
///
/// Partial failures inside an import run (e.g. unmatched candidates) are
/// normal outcomes and are never represented as a `DomainError`.
#[derive(Debug, Clone, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    /// Field-level detail for validation errors.
    pub field: Option<String>,
}

impl DomainError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Validation,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

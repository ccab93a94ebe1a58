// ABOUTME: Unified error handling system with standard error codes for all core operations
// ABOUTME: Maps caller mistakes, precondition failures, and upstream faults to typed results
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Unified Error Handling System
//!
//! Every core operation returns [`AppResult`]; failures are always surfaced as
//! a typed [`AppError`] with a stable [`ErrorCode`], never swallowed as a
//! default. The transport layer (out of scope here) maps codes to HTTP
//! statuses via [`ErrorCode::http_status`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reason string carried by `FailedPrecondition` when the stored integration
/// can no longer mint access tokens and the user must restart authorization.
pub const REAUTH_REQUIRED: &str = "reauth_required";

/// Reason string carried by `FailedPrecondition` when no token set has ever
/// been stored for the user's integration.
pub const NO_TOKENS: &str = "no tokens";

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Missing or malformed caller input; never retried, caller must fix the request
    #[serde(rename = "INVALID_ARGUMENT")]
    InvalidArgument,
    /// A uniqueness invariant would be violated; caller must pick another key
    #[serde(rename = "ALREADY_EXISTS")]
    AlreadyExists,
    /// The integration is not in a usable state (e.g. `reauth_required`)
    #[serde(rename = "FAILED_PRECONDITION")]
    FailedPrecondition,
    /// Required configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Document store operation failed (including exhausted conflict retries)
    #[serde(rename = "STORAGE_ERROR")]
    StorageError,
    /// Upstream/transport failure after the bounded retry policy is exhausted
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::AlreadyExists => 409,
            Self::FailedPrecondition => 412,
            Self::ConfigError | Self::StorageError | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::InvalidArgument => "The provided input is invalid",
            Self::AlreadyExists => "A record with this key already exists",
            Self::FailedPrecondition => "The operation cannot run in the current state",
            Self::ConfigError => "Configuration error encountered",
            Self::StorageError => "Document store operation failed",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Invalid caller input
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Uniqueness invariant violation
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, message)
    }

    /// Integration not in a usable state
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FailedPrecondition, message)
    }

    /// Token set absent; the user has never authorized the integration
    #[must_use]
    pub fn no_tokens() -> Self {
        Self::new(ErrorCode::FailedPrecondition, NO_TOKENS)
    }

    /// Terminal token state; the user must restart the authorization-code flow
    #[must_use]
    pub fn reauth_required() -> Self {
        Self::new(ErrorCode::FailedPrecondition, REAUTH_REQUIRED)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Document store error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Whether this failure means the caller must show the re-authorization flow
    #[must_use]
    pub fn is_reauth_required(&self) -> bool {
        self.code == ErrorCode::FailedPrecondition && self.message == REAUTH_REQUIRED
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidArgument.http_status(), 400);
        assert_eq!(ErrorCode::AlreadyExists.http_status(), 409);
        assert_eq!(ErrorCode::FailedPrecondition.http_status(), 412);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_reauth_required_detection() {
        assert!(AppError::reauth_required().is_reauth_required());
        assert!(!AppError::no_tokens().is_reauth_required());
        assert!(!AppError::internal(REAUTH_REQUIRED).is_reauth_required());
    }

    #[test]
    fn test_error_display_includes_code_description() {
        let err = AppError::already_exists("weight already recorded for 2024-01-01");
        let rendered = err.to_string();
        assert!(rendered.contains("already exists"));
        assert!(rendered.contains("2024-01-01"));
    }
}

// ABOUTME: Structured error types for external activity-service operations
// ABOUTME: Distinguishes auth failures (retryable via forced refresh) from other upstream faults
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Errors from the external activity service and its token endpoint
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The bearer token was rejected (HTTP 401). The orchestration layer
    /// recovers from this exactly once via a forced token refresh.
    #[error("{provider} rejected the access token: {reason}")]
    Unauthorized {
        /// Provider name
        provider: String,
        /// Upstream detail
        reason: String,
    },

    /// Token grant failed at the OAuth endpoint (transport or non-2xx)
    #[error("{provider} token grant failed: {reason}")]
    AuthenticationFailed {
        /// Provider name
        provider: String,
        /// Upstream detail
        reason: String,
    },

    /// Non-auth API failure (non-2xx other than 401)
    #[error("{provider} API error (status {status_code}): {message}")]
    ApiError {
        /// Provider name
        provider: String,
        /// HTTP status code returned upstream
        status_code: u16,
        /// Upstream response body or summary
        message: String,
    },

    /// Request never produced an HTTP response (DNS, connect, timeout)
    #[error("{provider} transport failure: {source}")]
    Transport {
        /// Provider name
        provider: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Upstream returned a body this client cannot interpret
    #[error("{provider} returned invalid data for {field}: {reason}")]
    InvalidData {
        /// Provider name
        provider: String,
        /// Field or payload that failed to parse
        field: String,
        /// Parse detail
        reason: String,
    },
}

/// Result alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

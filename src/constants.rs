// ABOUTME: Application constants shared across the ledger core and WHOOP integration
// ABOUTME: Centralizes time margins, energy conversion factors, and provider identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application constants and configuration values

/// OAuth provider identifiers
pub mod oauth_providers {
    /// WHOOP provider name, also used as the integration document key
    pub const WHOOP: &str = "whoop";
}

/// Time-related constants
pub mod time {
    /// Safety margin subtracted from `expires_at` before a stored access token
    /// is trusted, covering clock skew and in-flight request latency
    pub const TOKEN_EXPIRY_MARGIN_MILLIS: i64 = 60_000;

    /// Token lifetime assumed when the token endpoint omits `expires_in`
    pub const DEFAULT_TOKEN_EXPIRY_SECONDS: i64 = 3600;
}

/// Energy unit conversion
pub mod energy {
    /// Kilojoules per kilocalorie (thermochemical calorie)
    pub const KILOJOULES_PER_KILOCALORIE: f64 = 4.184;
}

/// Outbound HTTP timeout budgets
pub mod network {
    /// Request timeout for OAuth token grants, which should be fast
    pub const OAUTH_TIMEOUT_SECS: u64 = 15;
    /// Connect timeout for OAuth token grants
    pub const OAUTH_CONNECT_TIMEOUT_SECS: u64 = 5;
    /// Request timeout for activity API calls
    pub const API_TIMEOUT_SECS: u64 = 30;
    /// Connect timeout for activity API calls
    pub const API_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Service names for structured logging
pub mod service_names {
    /// This service
    pub const MACROLOG_CORE: &str = "macrolog-core";
}

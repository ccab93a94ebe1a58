// ABOUTME: OAuth 2.0 client side of the WHOOP integration: endpoint client and token lifecycle
// ABOUTME: Splits the wire protocol (client) from the reuse/refresh/reauth policy (token_manager)
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth 2.0 client (this service as client to the WHOOP token endpoint)

/// Token endpoint client and grant types
pub mod client;

/// Token lifecycle management with per-user single-flight refresh
pub mod token_manager;

pub use client::{AuthorizationEndpoint, OAuth2Token, WhoopAuthClient};
pub use token_manager::{ExchangeSummary, TokenManager};

// ABOUTME: External activity-service adapters and their error taxonomy
// ABOUTME: The ActivityFeed trait is the seam the orchestration layer depends on
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External activity-service adapters

/// Provider error taxonomy
pub mod errors;

/// WHOOP cycle-data client
pub mod whoop;

pub use errors::{ProviderError, ProviderResult};
pub use whoop::{ActivityFeed, CycleRecord, WhoopClient};

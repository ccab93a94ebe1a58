// ABOUTME: Logging configuration and structured logging setup for observability and debugging
// ABOUTME: Configures tracing-subscriber with env-filtered json/pretty/compact output
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production logging configuration with structured output

use crate::constants::service_names;
use anyhow::Result;
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Per-crate directives applied on top of `RUST_LOG` to quiet HTTP internals
const NOISE_DIRECTIVES: [&str; 2] = ["hyper=warn", "reqwest=warn"];

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Service name for structured logging
    pub service_name: String,
}

/// Log output format options
#[derive(Debug, Clone)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            service_name: service_names::MACROLOG_CORE.into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        Self {
            level,
            format,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::MACROLOG_CORE.into()),
        }
    }

    /// Install the global tracing subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        let mut filter = EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"));
        for directive in NOISE_DIRECTIVES {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }

        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            LogFormat::Json => {
                registry
                    .with(fmt::layer().with_target(true).with_writer(io::stdout).json())
                    .try_init()?;
            }
            LogFormat::Pretty => {
                registry
                    .with(fmt::layer().with_target(true).with_writer(io::stdout))
                    .try_init()?;
            }
            LogFormat::Compact => {
                registry
                    .with(
                        fmt::layer()
                            .compact()
                            .with_target(false)
                            .with_writer(io::stdout),
                    )
                    .try_init()?;
            }
        }

        info!(service = %self.service_name, "logging initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::Directive;

    #[test]
    fn test_noise_directives_parse() {
        for directive in NOISE_DIRECTIVES {
            assert!(directive.parse::<Directive>().is_ok(), "{directive}");
        }
    }
}

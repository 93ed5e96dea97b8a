//! Server configuration from environment variables.

use std::time::Duration;

/// Server configuration.
///
/// Loaded from the environment (`.env` supported via `dotenvy`):
///
/// - `BIND_ADDR` - listen address (default `0.0.0.0:3000`)
/// - `DATABASE_URL` - Postgres connection string (required)
/// - `PROVIDER_DEADLINE_MS` - per-call store deadline (default `5000`)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Postgres connection string
    pub database_url: String,
    /// Deadline applied to every provider call
    pub provider_deadline: Duration,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error message when `DATABASE_URL` is missing or a
    /// numeric variable fails to parse.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error message when `DATABASE_URL` is missing or a
    /// numeric variable fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let provider_deadline = match lookup("PROVIDER_DEADLINE_MS") {
            Some(raw) => Duration::from_millis(
                raw.parse::<u64>()
                    .map_err(|_| format!("PROVIDER_DEADLINE_MS is not a number: {raw}"))?,
            ),
            None => Duration::from_secs(5),
        };

        Ok(Self { bind_addr, database_url, provider_deadline })
    }
}

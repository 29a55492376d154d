//! Harness configuration.
//!
//! Configuration is validated at load time, with sensible defaults and
//! clear error messages: a typo'd handler name should fail the suite's
//! setup, not silently skip an injection.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LatencyError, Result};
use crate::latency::DEFAULT_DELAY;

/// Latency-injection configuration for a test suite.
///
/// Typically loaded from a TOML fixture file and applied through
/// [`LatencySession::apply`](crate::LatencySession::apply) in a "before"
/// hook:
///
/// ```toml
/// delay = "1s 500ms"
/// handlers = ["create", "update"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyConfig {
    /// Injected delay per wrapped handler.
    ///
    /// Must exceed the consuming test driver's round trip from "request
    /// dispatched" to "assertion evaluated"; one second is a safe floor
    /// for browser-driven suites.
    #[serde(default = "default_delay")]
    #[serde(with = "humantime_serde")]
    pub delay: Duration,

    /// Handler names to wrap during suite setup.
    #[serde(default)]
    pub handlers: Vec<String>,
}

const fn default_delay() -> Duration {
    DEFAULT_DELAY
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            delay: default_delay(),
            handlers: Vec::new(),
        }
    }
}

impl LatencyConfig {
    /// Creates a configuration with the default one-second delay.
    #[must_use]
    pub fn new(handlers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            delay: default_delay(),
            handlers: handlers.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the injected delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if a handler name is empty or listed twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for name in &self.handlers {
            if name.is_empty() {
                return Err(LatencyError::config("handler name cannot be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(LatencyError::config(format!(
                    "handler `{name}` listed more than once"
                )));
            }
        }
        Ok(())
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or fails
    /// validation.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LatencyError::config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LatencyError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

/// Serde helper for humantime durations.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes a duration as a human-readable string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    /// Deserializes a duration from a human-readable string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

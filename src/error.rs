//! Error types for latency injection.
//!
//! Every failure mode of the harness is explicit: a failed install or
//! restore must fail the test's setup/teardown step outright, because a
//! silently skipped injection reintroduces exactly the flakiness this
//! crate exists to eliminate.

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, LatencyError>;

/// Errors raised by the latency-injection harness.
///
/// Application-level errors produced by a wrapped handler are *not*
/// represented here: the response type is generic and whatever the
/// original handler returns (including its own `Result::Err`) passes
/// through the wrapper untouched.
#[derive(Debug, thiserror::Error)]
pub enum LatencyError {
    /// No handler is registered under the given name on the target.
    #[error("no handler named `{handler}` on target `{target}`")]
    MissingHandler {
        /// Name of the target table.
        target: String,
        /// Requested handler name.
        handler: String,
    },

    /// Latency is already installed for this (target, handler) pair.
    ///
    /// Installing twice without an intervening restore would overwrite
    /// the preserved original and lose it permanently, so it is rejected.
    #[error("latency already installed for `{handler}` on target `{target}`")]
    AlreadyInstalled {
        /// Name of the target table.
        target: String,
        /// Handler name the wrap was attempted on.
        handler: String,
    },

    /// Restore was requested but no latency is installed for the pair.
    #[error("no latency installed for `{handler}` on target `{target}`")]
    NotInstalled {
        /// Name of the target table.
        target: String,
        /// Handler name the restore was attempted on.
        handler: String,
    },

    /// The reserved backup name is already bound by a user registration.
    #[error("reserved backup name `{backup}` already bound on target `{target}`")]
    ReservedName {
        /// Name of the target table.
        target: String,
        /// The colliding backup key.
        backup: String,
    },

    /// A handler is already registered under the given name.
    #[error("handler `{handler}` already registered on target `{target}`")]
    DuplicateHandler {
        /// Name of the target table.
        target: String,
        /// The duplicate handler name.
        handler: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LatencyError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if this error indicates a violated install/restore
    /// pairing (the harness was driven out of order), as opposed to a
    /// missing handler or bad configuration.
    #[must_use]
    pub const fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInstalled { .. } | Self::NotInstalled { .. } | Self::ReservedName { .. }
        )
    }
}

//! Latency injection: the interceptor/restorer pair.
//!
//! # Reference
//! Netflix. (2012). Chaos Monkey. GitHub.
//! <https://github.com/Netflix/chaosmonkey>
//!
//! Installing latency on a handler replaces its binding with a
//! delay-then-delegate wrapper and preserves the original under a reserved
//! backup name; restoring reinstates the original binding. The wrapper
//! forwards the request and returns the original's response untouched —
//! the only observable difference is that the delay elapses in full before
//! the original begins executing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LatencyError, Result};
use crate::handler::{Handler, SharedHandler};
use crate::table::HandlerTable;

/// Default injected delay.
///
/// One second comfortably exceeds the round trip of a typical UI test
/// driver between dispatching a request and evaluating an assertion, which
/// is what makes the intermediate state observable deterministically.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Prefix under which the preserved original binding is stored.
pub(crate) const BACKUP_PREFIX: &str = "old_";

/// Returns the reserved backup name for a handler.
#[must_use]
pub fn backup_name(handler: &str) -> String {
    format!("{BACKUP_PREFIX}{handler}")
}

/// Delay-then-delegate wrapper around a preserved handler binding.
struct DelayedHandler<Req, Resp> {
    inner: SharedHandler<Req, Resp>,
    delay: Duration,
}

#[async_trait]
impl<Req, Resp> Handler<Req, Resp> for DelayedHandler<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req) -> Resp {
        tracing::debug!(delay = ?self.delay, "injecting latency");
        // The sleep must elapse in full before the original runs; this is
        // the ordering guarantee consuming tests rely on.
        tokio::time::sleep(self.delay).await;
        self.inner.call(request).await
    }
}

impl<Req, Resp> HandlerTable<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Installs a delay wrapper on the handler registered under `name`.
    ///
    /// The current binding is preserved under [`backup_name`] and `name`
    /// is rebound to a wrapper that sleeps for `delay`, then delegates to
    /// the preserved original with the same request.
    ///
    /// # Errors
    /// - [`LatencyError::AlreadyInstalled`] if latency is already
    ///   installed for this pair (the preserved original is untouched).
    /// - [`LatencyError::MissingHandler`] if no handler named `name`
    ///   exists on this table.
    /// - [`LatencyError::ReservedName`] if a user registration already
    ///   occupies the backup name.
    pub fn install_latency(&self, name: &str, delay: Duration) -> Result<()> {
        let backup = backup_name(name);
        let mut state = self.state().write();

        if state.wrapped.contains(name) {
            return Err(LatencyError::AlreadyInstalled {
                target: self.name().to_string(),
                handler: name.to_string(),
            });
        }
        if state.bindings.contains_key(&backup) {
            return Err(LatencyError::ReservedName {
                target: self.name().to_string(),
                backup,
            });
        }
        let Some(original) = state.bindings.remove(name) else {
            return Err(self.missing(name));
        };

        let wrapper: SharedHandler<Req, Resp> = Arc::new(DelayedHandler {
            inner: Arc::clone(&original),
            delay,
        });
        state.bindings.insert(backup, original);
        state.bindings.insert(name.to_string(), wrapper);
        state.wrapped.insert(name.to_string());

        tracing::info!(
            target_table = %self.name(),
            handler = %name,
            delay = ?delay,
            "latency installed"
        );
        Ok(())
    }

    /// Removes an installed delay wrapper, reinstating the preserved
    /// original binding (same `Arc` identity) under `name` and releasing
    /// the backup entry.
    ///
    /// # Errors
    /// Returns [`LatencyError::NotInstalled`] if no latency is installed
    /// for this pair — including a second restore after a successful one.
    pub fn restore_latency(&self, name: &str) -> Result<()> {
        let backup = backup_name(name);
        let mut state = self.state().write();

        if !state.wrapped.contains(name) {
            return Err(LatencyError::NotInstalled {
                target: self.name().to_string(),
                handler: name.to_string(),
            });
        }
        let Some(original) = state.bindings.remove(&backup) else {
            // Wrapped marker without a backup binding: the pair was torn
            // apart externally, treat as not installed.
            state.wrapped.remove(name);
            return Err(LatencyError::NotInstalled {
                target: self.name().to_string(),
                handler: name.to_string(),
            });
        };

        state.bindings.insert(name.to_string(), original);
        state.wrapped.remove(name);

        tracing::info!(target_table = %self.name(), handler = %name, "latency restored");
        Ok(())
    }

    /// Returns true if latency is currently installed for `name`.
    #[must_use]
    pub fn latency_installed(&self, name: &str) -> bool {
        self.state().read().wrapped.contains(name)
    }
}

/// Installs a delay wrapper on `(table, handler)`.
///
/// Free-function spelling of [`HandlerTable::install_latency`], matching
/// the setup-hook call site: wrap before exercising the system under test.
///
/// # Errors
/// See [`HandlerTable::install_latency`].
pub fn simulate_latency_for<Req, Resp>(
    table: &HandlerTable<Req, Resp>,
    handler: &str,
    delay: Duration,
) -> Result<()>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    table.install_latency(handler, delay)
}

/// Restores the original handler binding on `(table, handler)`.
///
/// Free-function spelling of [`HandlerTable::restore_latency`], matching
/// the teardown-hook call site.
///
/// # Errors
/// See [`HandlerTable::restore_latency`].
pub fn restore_latency_for<Req, Resp>(table: &HandlerTable<Req, Resp>, handler: &str) -> Result<()>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    table.restore_latency(handler)
}

/// RAII handle for one installed wrap.
///
/// Restores the wrapped handler when dropped, so a panicking test still
/// releases its injection. Prefer [`restore`](Self::restore) in teardown
/// code that wants the error surfaced.
pub struct LatencyGuard<'a, Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    table: &'a HandlerTable<Req, Resp>,
    handler: String,
    armed: bool,
}

impl<'a, Req, Resp> LatencyGuard<'a, Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Installs latency on `(table, handler)` and returns a guard that
    /// restores it on drop.
    ///
    /// # Errors
    /// See [`HandlerTable::install_latency`].
    pub fn install(table: &'a HandlerTable<Req, Resp>, handler: &str, delay: Duration) -> Result<Self> {
        table.install_latency(handler, delay)?;
        Ok(Self {
            table,
            handler: handler.to_string(),
            armed: true,
        })
    }

    /// Restores the wrapped handler now, consuming the guard.
    ///
    /// # Errors
    /// See [`HandlerTable::restore_latency`].
    pub fn restore(mut self) -> Result<()> {
        self.armed = false;
        self.table.restore_latency(&self.handler)
    }

    /// Returns the wrapped handler name.
    #[must_use]
    pub fn handler(&self) -> &str {
        &self.handler
    }
}

impl<Req, Resp> Drop for LatencyGuard<'_, Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.table.restore_latency(&self.handler) {
            tracing::error!(
                target_table = %self.table.name(),
                handler = %self.handler,
                error = %e,
                "failed to restore latency on guard drop"
            );
        }
    }
}

//! Test-scoped injection registry.
//!
//! A [`LatencySession`] tracks every wrap it installed during one test (or
//! one suite phase) and restores them all at teardown. Scoping the
//! bookkeeping to an owned value — instead of ambient global state — means
//! a forgotten restore cannot leak into the next test: dropping the
//! session reverts whatever is still installed.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::LatencyConfig;
use crate::error::Result;
use crate::latency::DEFAULT_DELAY;
use crate::table::HandlerTable;

/// Tracks installed (table, handler) pairs for one test's lifetime.
///
/// # Example
///
/// ```rust,ignore
/// let session = LatencySession::new();
/// session.install(&notes, "create")?;          // before hook
/// // ... exercise the system under test ...
/// session.restore_all()?;                      // after hook
/// ```
pub struct LatencySession<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    default_delay: Duration,
    installed: Mutex<Vec<(Arc<HandlerTable<Req, Resp>>, String)>>,
}

impl<Req, Resp> LatencySession<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Creates a session with the default one-second delay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_delay: DEFAULT_DELAY,
            installed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a session with a custom default delay.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            installed: Mutex::new(Vec::new()),
        }
    }

    /// Returns the session's default delay.
    #[must_use]
    pub const fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Installs latency on `(table, handler)` with the session default
    /// delay and records the pair for teardown.
    ///
    /// # Errors
    /// See [`HandlerTable::install_latency`].
    pub fn install(&self, table: &Arc<HandlerTable<Req, Resp>>, handler: &str) -> Result<()> {
        self.install_with(table, handler, self.default_delay)
    }

    /// Installs latency with an explicit delay and records the pair.
    ///
    /// # Errors
    /// See [`HandlerTable::install_latency`].
    pub fn install_with(
        &self,
        table: &Arc<HandlerTable<Req, Resp>>,
        handler: &str,
        delay: Duration,
    ) -> Result<()> {
        table.install_latency(handler, delay)?;
        self.installed
            .lock()
            .push((Arc::clone(table), handler.to_string()));
        Ok(())
    }

    /// Validates `config` and installs latency on every handler it names.
    ///
    /// # Errors
    /// Returns the first configuration or install error; pairs installed
    /// before the failure stay recorded and are still restored at
    /// teardown.
    pub fn apply(&self, config: &LatencyConfig, table: &Arc<HandlerTable<Req, Resp>>) -> Result<()> {
        config.validate()?;
        for handler in &config.handlers {
            self.install_with(table, handler, config.delay)?;
        }
        Ok(())
    }

    /// Restores one recorded pair.
    ///
    /// # Errors
    /// See [`HandlerTable::restore_latency`]; also fails if the pair was
    /// never installed through this session.
    pub fn restore(&self, table: &Arc<HandlerTable<Req, Resp>>, handler: &str) -> Result<()> {
        let mut installed = self.installed.lock();
        let position = installed
            .iter()
            .position(|(t, h)| Arc::ptr_eq(t, table) && h == handler)
            .ok_or_else(|| crate::error::LatencyError::NotInstalled {
                target: table.name().to_string(),
                handler: handler.to_string(),
            })?;
        let (table, handler) = installed.remove(position);
        drop(installed);
        table.restore_latency(&handler)
    }

    /// Restores every pair still recorded, most recent first.
    ///
    /// Every pair is attempted even if one fails; the first error is
    /// returned so teardown hooks fail loudly.
    ///
    /// # Errors
    /// Returns the first restore error encountered.
    pub fn restore_all(&self) -> Result<()> {
        let mut installed = self.installed.lock();
        let mut first_error = None;
        while let Some((table, handler)) = installed.pop() {
            if let Err(e) = table.restore_latency(&handler) {
                tracing::warn!(
                    target_table = %table.name(),
                    handler = %handler,
                    error = %e,
                    "restore failed during session teardown"
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Returns how many pairs are currently installed through this
    /// session.
    #[must_use]
    pub fn installed_count(&self) -> usize {
        self.installed.lock().len()
    }
}

impl<Req, Resp> Default for LatencySession<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Resp> Drop for LatencySession<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn drop(&mut self) {
        let installed = self.installed.get_mut();
        if installed.is_empty() {
            return;
        }
        tracing::warn!(
            remaining = installed.len(),
            "latency session dropped with wraps still installed; restoring"
        );
        while let Some((table, handler)) = installed.pop() {
            if let Err(e) = table.restore_latency(&handler) {
                tracing::error!(
                    target_table = %table.name(),
                    handler = %handler,
                    error = %e,
                    "failed to restore latency during session drop"
                );
            }
        }
    }
}

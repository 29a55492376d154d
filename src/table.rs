//! Named handler registry — the *target* that latency is installed on.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::error::{LatencyError, Result};
use crate::handler::SharedHandler;

/// Locked interior of a [`HandlerTable`].
///
/// Bindings and the set of names currently carrying an installed wrap are
/// kept under one lock so install/restore can uphold their invariants
/// atomically (at most one preserved original per name, backup present
/// exactly while wrapped).
pub(crate) struct TableState<Req, Resp> {
    pub(crate) bindings: HashMap<String, SharedHandler<Req, Resp>>,
    pub(crate) wrapped: HashSet<String>,
}

/// A named target owning a namespace of request handlers.
///
/// The table is the indirection point the harness needs: application code
/// dispatches requests through it by handler name, and the harness swaps
/// bindings in it to install or remove a delay wrapper.
///
/// # Shared-mutation hazard
///
/// A table is typically held in an `Arc` and shared process-wide between
/// the application under test and the harness. Installing latency mutates
/// the binding **for every caller** of the table, not just the test that
/// installed it — including requests already queued behind the dispatcher.
/// Run tests that wrap the same (table, handler) pair sequentially, or
/// give each test its own table.
pub struct HandlerTable<Req, Resp> {
    name: String,
    state: RwLock<TableState<Req, Resp>>,
}

impl<Req, Resp> HandlerTable<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Creates an empty table with the given target name.
    ///
    /// The name only serves diagnostics (errors and tracing); identity is
    /// the table reference itself.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(TableState {
                bindings: HashMap::new(),
                wrapped: HashSet::new(),
            }),
        }
    }

    /// Returns the target name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a handler under `name`.
    ///
    /// Handler names are unique within a table; registering over an
    /// existing binding is rejected so application code cannot stomp an
    /// installed wrapper (or vice versa).
    ///
    /// # Errors
    /// Returns [`LatencyError::DuplicateHandler`] if `name` is taken.
    pub fn register(&self, name: impl Into<String>, handler: SharedHandler<Req, Resp>) -> Result<()> {
        let name = name.into();
        let mut state = self.state.write();
        if state.bindings.contains_key(&name) {
            return Err(LatencyError::DuplicateHandler {
                target: self.name.clone(),
                handler: name,
            });
        }
        tracing::debug!(target_table = %self.name, handler = %name, "registering handler");
        state.bindings.insert(name, handler);
        Ok(())
    }

    /// Removes the handler registered under `name`, returning its binding.
    ///
    /// A handler that currently carries an installed wrap cannot be
    /// deregistered, and neither can its reserved backup binding; restore
    /// first, otherwise the preserved original would be stranded.
    ///
    /// # Errors
    /// Returns [`LatencyError::MissingHandler`] if no such handler exists,
    /// or [`LatencyError::AlreadyInstalled`] if latency is installed on it
    /// (or `name` is the backup of an installed wrap).
    pub fn deregister(&self, name: &str) -> Result<SharedHandler<Req, Resp>> {
        let mut state = self.state.write();
        if state.wrapped.contains(name) {
            return Err(LatencyError::AlreadyInstalled {
                target: self.name.clone(),
                handler: name.to_string(),
            });
        }
        if let Some(base) = name.strip_prefix(crate::latency::BACKUP_PREFIX) {
            if state.wrapped.contains(base) {
                return Err(LatencyError::AlreadyInstalled {
                    target: self.name.clone(),
                    handler: base.to_string(),
                });
            }
        }
        state.bindings.remove(name).ok_or_else(|| self.missing(name))
    }

    /// Returns true if a handler named `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.state.read().bindings.contains_key(name)
    }

    /// Returns the current binding for `name`, if any.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<SharedHandler<Req, Resp>> {
        self.state.read().bindings.get(name).cloned()
    }

    /// Returns all registered handler names, sorted.
    ///
    /// While a wrap is installed this includes the reserved backup name,
    /// mirroring exactly what the table binds at that moment.
    #[must_use]
    pub fn handler_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().bindings.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().bindings.len()
    }

    /// Returns true if the table has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().bindings.is_empty()
    }

    /// Dispatches a request to the handler registered under `name`.
    ///
    /// The binding is cloned out of the table before the call, so dispatch
    /// never holds the table lock across handler execution — an injected
    /// delay stalls the dispatching task, not the table.
    ///
    /// # Errors
    /// Returns [`LatencyError::MissingHandler`] if no such handler exists.
    pub async fn dispatch(&self, name: &str, request: Req) -> Result<Resp> {
        let handler = self.handler(name).ok_or_else(|| self.missing(name))?;
        Ok(handler.call(request).await)
    }

    pub(crate) fn state(&self) -> &RwLock<TableState<Req, Resp>> {
        &self.state
    }

    pub(crate) fn missing(&self, name: &str) -> LatencyError {
        LatencyError::MissingHandler {
            target: self.name.clone(),
            handler: name.to_string(),
        }
    }
}

impl<Req, Resp> std::fmt::Debug for HandlerTable<Req, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("HandlerTable")
            .field("name", &self.name)
            .field("handlers", &state.bindings.len())
            .field("wrapped", &state.wrapped.len())
            .finish()
    }
}

// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # demora
//!
//! Deterministic latency injection for handler-based integration tests.
//!
//! A test that asserts on a transient state — a loading indicator, an
//! in-flight counter, a disabled submit button — races the response that
//! erases that state. Such a test is flaky by construction unless the
//! window between "request dispatched" and "response processed" is under
//! the test's control. This crate makes that window controllable:
//!
//! - [`HandlerTable`]: a named registry of request handlers, the
//!   indirection point the harness swaps bindings in
//! - [`HandlerTable::install_latency`] / [`HandlerTable::restore_latency`]:
//!   the interceptor/restorer pair (also as the free functions
//!   [`simulate_latency_for`] / [`restore_latency_for`])
//! - [`LatencyGuard`]: RAII wrap that restores on drop
//! - [`LatencySession`]: test-scoped registry restoring everything at
//!   teardown
//! - [`LatencyConfig`]: TOML-loadable suite configuration
//!
//! The injected delay elapses in full before the original handler begins
//! executing, and the wrapper forwards arguments and responses untouched —
//! timing is the only observable difference.
//!
//! ## Example
//!
//! ```rust,ignore
//! use demora::{handler_fn, HandlerTable, LatencySession};
//!
//! let notes = Arc::new(HandlerTable::new("notes"));
//! notes.register("create", handler_fn(|body: String| Response::ok(body)))?;
//!
//! let session = LatencySession::new();
//! session.install(&notes, "create")?;          // before hook
//!
//! // dispatching "create" now takes >= 1s; assert the loading state here
//!
//! session.restore_all()?;                      // after hook
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handler;
pub mod latency;
pub mod session;
pub mod table;

pub use config::LatencyConfig;
pub use error::{LatencyError, Result};
pub use handler::{async_handler_fn, handler_fn, AsyncFnHandler, FnHandler, Handler, SharedHandler};
pub use latency::{
    backup_name, restore_latency_for, simulate_latency_for, LatencyGuard, DEFAULT_DELAY,
};
pub use session::LatencySession;
pub use table::HandlerTable;

//! Handler abstraction.
//!
//! A handler is a named, invocable unit that processes one request on
//! behalf of a target. Handlers are stored as shared trait objects so the
//! harness can swap a binding without touching the handler's own code:
//! wrapping is pure composition over [`SharedHandler`] values.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

/// A request handler owned by a [`HandlerTable`](crate::HandlerTable).
///
/// The request and response types are free parameters: the harness never
/// inspects them, which is what makes an installed wrapper transparent to
/// arguments, return values, and application-level errors (a `Resp` of
/// `Result<T, E>` flows through unchanged).
#[async_trait]
pub trait Handler<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Processes one request.
    async fn call(&self, request: Req) -> Resp;
}

/// Shared, swappable handler binding.
pub type SharedHandler<Req, Resp> = Arc<dyn Handler<Req, Resp>>;

/// Adapter turning a synchronous closure into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    /// Wraps a synchronous closure.
    #[must_use]
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<Req, Resp, F> Handler<Req, Resp> for FnHandler<F>
where
    F: Fn(Req) -> Resp + Send + Sync,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req) -> Resp {
        (self.f)(request)
    }
}

/// Adapter turning an async closure into a [`Handler`].
pub struct AsyncFnHandler<F> {
    f: F,
}

impl<F> AsyncFnHandler<F> {
    /// Wraps an async closure.
    #[must_use]
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<Req, Resp, F, Fut> Handler<Req, Resp> for AsyncFnHandler<F>
where
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Resp> + Send,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req) -> Resp {
        (self.f)(request).await
    }
}

/// Wraps a synchronous closure as a [`SharedHandler`].
///
/// # Example
///
/// ```rust,ignore
/// let echo = handler_fn(|req: String| req.to_uppercase());
/// table.register("echo", echo)?;
/// ```
#[must_use]
pub fn handler_fn<Req, Resp, F>(f: F) -> SharedHandler<Req, Resp>
where
    F: Fn(Req) -> Resp + Send + Sync + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// Wraps an async closure as a [`SharedHandler`].
#[must_use]
pub fn async_handler_fn<Req, Resp, F, Fut>(f: F) -> SharedHandler<Req, Resp>
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Resp> + Send + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    Arc::new(AsyncFnHandler { f })
}

//! Middleware chain composition.
//!
//! A [`MiddlewareChain`] is declared outermost-first: the first entry sees the
//! request first and the response last. Internally the list is kept reversed
//! so that folding it around the terminal handler wraps the last-declared
//! middleware innermost.
//!
//! ```ignore
//! let chain = MiddlewareChain::new(vec![logging, auth]);
//! let handler = chain.apply(endpoint(me, state));
//! // request: logging -> auth -> me ; response: me -> auth -> logging
//! ```

use async_trait::async_trait;
use axum::{extract::Request, handler::Handler as AxumHandler, response::Response};
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;
use tracing::debug;

/// A request handler: the terminal endpoint or a middleware-wrapped one.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, req: Request) -> Response;
}

pub type BoxHandler = Arc<dyn Handler>;

/// Wraps a handler into a new one.
///
/// The returned handler may do work before and after calling `next`, or
/// answer on its own without calling it.
pub trait Middleware: Send + Sync + 'static {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

/// Ordered, immutable middleware list. Build once, apply per route.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    // innermost first
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// `declared` is in execution order, outermost first.
    pub fn new<I>(declared: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        let mut layers: Vec<_> = declared.into_iter().collect();
        layers.reverse();
        Self { layers }
    }

    /// Like [`MiddlewareChain::new`], but `None` entries are skipped as
    /// pass-throughs. The remaining entries keep their relative order.
    pub fn from_optional<I>(declared: I) -> Self
    where
        I: IntoIterator<Item = Option<Arc<dyn Middleware>>>,
    {
        Self::new(declared.into_iter().enumerate().filter_map(|(pos, mw)| {
            if mw.is_none() {
                debug!(position = pos, "Skipping absent middleware");
            }
            mw
        }))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Middleware names in declared (execution) order
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().rev().map(|mw| mw.name()).collect()
    }

    /// Compose the chain around `terminal`.
    pub fn apply(&self, terminal: BoxHandler) -> BoxHandler {
        self.layers
            .iter()
            .fold(terminal, |next, middleware| middleware.wrap(next))
    }

    /// Compose and expose the result as a service axum routes can mount.
    pub fn service(&self, terminal: BoxHandler) -> ChainService {
        ChainService::new(self.apply(terminal))
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("layers", &self.names())
            .finish()
    }
}

/// Terminal handler built from an ordinary axum handler plus its state.
pub struct Endpoint<H, T, S> {
    handler: H,
    state: S,
    _marker: PhantomData<fn() -> T>,
}

/// Turn an axum handler into a terminal [`BoxHandler`].
pub fn endpoint<H, T, S>(handler: H, state: S) -> BoxHandler
where
    H: AxumHandler<T, S> + Sync,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    Arc::new(Endpoint {
        handler,
        state,
        _marker: PhantomData,
    })
}

#[async_trait]
impl<H, T, S> Handler for Endpoint<H, T, S>
where
    H: AxumHandler<T, S> + Sync,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    async fn call(&self, req: Request) -> Response {
        self.handler.clone().call(req, self.state.clone()).await
    }
}

/// `tower::Service` over a composed handler, for `post_service` and friends.
#[derive(Clone)]
pub struct ChainService {
    handler: BoxHandler,
}

impl ChainService {
    pub fn new(handler: BoxHandler) -> Self {
        Self { handler }
    }
}

impl Service<Request> for ChainService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let handler = self.handler.clone();
        Box::pin(async move { Ok(handler.call(req).await) })
    }
}

//! Middleware pipeline: composable before/after request logic.
//!
//! Each middleware wraps the next layer, enabling request inspection,
//! short-circuit responses, and response decoration without coupling handlers
//! to infrastructure concerns. The last entry of a pipeline is the endpoint,
//! which ignores its [`Next`].
//!
//! - [`Middleware`]: trait implemented by all middleware.
//! - [`Next`]: cursor into the remaining chain; call [`Next::run`] to advance.
//! - [`MiddlewareHandler`]: type-erased, cheaply-cloneable middleware function.
//! - [`from_middleware`]: converts a [`Middleware`] into a [`MiddlewareHandler`].
//! - [`AccessLogMiddleware`]: one log line per request.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::{Response, StatusCode, context::Context};

/// Boxed future every middleware returns.
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A type-erased, reference-counted middleware function.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use pathrouter::{context::Context, middleware::{MiddlewareHandler, Next}};
///
/// let pass_through: MiddlewareHandler = Arc::new(|ctx: Context, next: Next| {
///     Box::pin(async move { next.run(ctx).await })
/// });
/// ```
pub type MiddlewareHandler =
    Arc<dyn Fn(Context, Next) -> MiddlewareFuture + Send + Sync + 'static>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// A cursor into the remaining middleware chain for a single request.
///
/// The chain itself is shared; advancing only moves an index, so building a
/// `Next` per request does not copy the pipeline.
pub struct Next {
    chain: Arc<[MiddlewareHandler]>,
    index: usize,
}

impl Next {
    /// Creates a cursor positioned at the start of `chain`.
    pub fn new(chain: Arc<[MiddlewareHandler]>) -> Self {
        Self { chain, index: 0 }
    }

    /// Invokes the next middleware in the chain and returns its response.
    ///
    /// When the chain is exhausted without any layer producing a response, a
    /// `500 Internal Server Error` is returned.
    pub async fn run(mut self, ctx: Context) -> Response {
        match self.chain.get(self.index).cloned() {
            Some(handler) => {
                self.index += 1;
                handler(ctx, self).await
            }
            None => Response::new(StatusCode::InternalServerError)
                .body("No response generated by middleware pipeline"),
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors may pass through (`next.run(ctx).await`), short-circuit by
/// returning a [`Response`] without calling `next`, or decorate the response
/// returned by `next`.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: Context, next: Next) -> MiddlewareFuture;
}

/// Logs one line per request once the response is known:
///
/// ```text
/// GET /api/kng/list http, 127.0.0.1:53422 - 200
/// ```
///
/// Successful and redirect-class responses are logged at `info`, client
/// errors at `warn`, server errors at `error`.
pub struct AccessLogMiddleware;

impl Middleware for AccessLogMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> MiddlewareFuture {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().to_string();
            let path = ctx.request().path().to_owned();
            let remote = ctx
                .request()
                .remote_addr()
                .map_or_else(|| "-".to_owned(), |addr| addr.to_string());

            let response = next.run(ctx).await;

            let status = response.status();
            let elapsed = start.elapsed();
            let code = status.as_u16();
            if status.is_server_error() {
                error!(?elapsed, "{method} {path} http, {remote} - {code}");
            } else if status.is_client_error() {
                warn!(?elapsed, "{method} {path} http, {remote} - {code}");
            } else {
                info!(?elapsed, "{method} {path} http, {remote} - {code}");
            }

            response
        })
    }
}

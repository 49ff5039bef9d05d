//! Front controller.
//!
//! A single catch-all entry point under the configured API prefix. Every
//! request runs through the middleware pipeline (access log, then CORS) and
//! ends at the dispatcher, which sees the path with the prefix removed.
//!
//! ```text
//! Server ──► Gateway::handle ──► AccessLog ──► Cors ──► endpoint ──► Dispatcher
//! ```

pub mod responder;

use std::future::Future;
use std::sync::Arc;

use crate::config::WebserverConfig;
use crate::context::Context;
use crate::http::{Request, Response};
use crate::middleware::{
    AccessLogMiddleware, MiddlewareFuture, MiddlewareHandler, Next, from_middleware,
};
use crate::router::{Dispatcher, RouteError};
use crate::security::CorsMiddleware;
use crate::server::{Server, ServerError};

/// Shared request pipeline in front of a [`Dispatcher`].
///
/// Cloning is cheap; every clone shares the same dispatcher and chain.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use pathrouter::config::WebserverConfig;
/// use pathrouter::gateway::Gateway;
/// use pathrouter::router::{Dispatcher, RouteTable};
/// use pathrouter::{Response, StatusCode};
///
/// let webserver = WebserverConfig { api_prefix: "/api".into(), ..Default::default() };
/// let mut table = RouteTable::new();
/// table.mount("/ping", |_ctx| async { Ok(Response::new(StatusCode::NoContent)) }, ["GET"]).unwrap();
///
/// let gateway = Gateway::new(Arc::new(Dispatcher::new(table, &webserver)), &webserver);
/// assert_eq!(gateway.dispatcher().table().len(), 1);
/// ```
#[derive(Clone)]
pub struct Gateway {
    dispatcher: Arc<Dispatcher>,
    chain: Arc<[MiddlewareHandler]>,
}

impl Gateway {
    pub fn new(dispatcher: Arc<Dispatcher>, webserver: &WebserverConfig) -> Self {
        let cors = CorsMiddleware::with_origins(webserver.cors_origins.iter().cloned());
        let endpoint = endpoint(Arc::clone(&dispatcher), webserver.prefix().to_owned());
        let chain: Arc<[MiddlewareHandler]> = Arc::from(vec![
            from_middleware(Arc::new(AccessLogMiddleware)),
            from_middleware(Arc::new(cors)),
            endpoint,
        ]);
        Self { dispatcher, chain }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs `request` through the pipeline. Never fails: every error is
    /// rendered as a JSON error response.
    pub async fn handle(&self, request: Request) -> Response {
        Next::new(Arc::clone(&self.chain))
            .run(Context::new(request))
            .await
    }

    /// Serves requests accepted by `server` until the process is terminated.
    pub async fn serve(self, server: Server) -> Result<(), ServerError> {
        self.serve_with_shutdown(server, std::future::pending())
            .await
    }

    /// Serves requests accepted by `server` until `shutdown` resolves.
    pub async fn serve_with_shutdown<S>(self, server: Server, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()>,
    {
        let gateway = Arc::new(self);
        server
            .run_with_shutdown(
                move |request: Request| {
                    let gateway = Arc::clone(&gateway);
                    async move { gateway.handle(request).await }
                },
                shutdown,
            )
            .await
    }
}

/// Last stage of the pipeline: strips the prefix and dispatches.
fn endpoint(dispatcher: Arc<Dispatcher>, prefix: String) -> MiddlewareHandler {
    Arc::new(move |ctx: Context, _next: Next| -> MiddlewareFuture {
        let dispatcher = Arc::clone(&dispatcher);
        let sub_path = strip_prefix(&prefix, ctx.request().path()).map(str::to_owned);
        Box::pin(async move {
            let Some(sub_path) = sub_path else {
                return responder::route_error(&RouteError::NotFound {
                    path: ctx.request().path().to_owned(),
                });
            };
            match dispatcher.dispatch(&sub_path, ctx).await {
                Ok(response) => response,
                Err(err) => responder::handler_error(&err),
            }
        })
    })
}

/// The part of `path` under `prefix`, or `None` when `path` lies outside it.
/// The prefix must end at a segment boundary: `/api` covers `/api/x` but not
/// `/apix`.
fn strip_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

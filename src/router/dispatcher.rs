//! Dispatcher: the serving phase.
//!
//! A [`Dispatcher`] owns the finished [`RouteTable`] and never mutates it, so
//! one instance behind an `Arc` serves every connection task without locking.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::error::RouteError;
use super::table::{CompiledRoute, RouteTable};
use super::template::decode_path;
use super::types::PathArgs;
use super::{Context, Handler, HandlerResult};
use crate::config::WebserverConfig;
use crate::gateway::responder;
use crate::http::Method;

/// The outcome of a successful match: which handler to call and with what.
#[derive(Clone)]
pub struct ResolvedCall {
    handler: Handler,
    args: PathArgs,
    template: Arc<str>,
}

impl ResolvedCall {
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Coerced path variables by name.
    pub fn args(&self) -> &PathArgs {
        &self.args
    }

    /// Template of the matched route.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Calls the handler with `ctx` carrying this call's arguments.
    pub async fn invoke(self, mut ctx: Context) -> HandlerResult {
        ctx.bind(self.args, self.template);
        (self.handler)(ctx).await
    }
}

impl std::fmt::Debug for ResolvedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCall")
            .field("template", &self.template)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Read-only router over a finished [`RouteTable`].
///
/// # Examples
///
/// ```rust
/// use pathrouter::config::WebserverConfig;
/// use pathrouter::router::{Dispatcher, RouteError, RouteTable};
/// use pathrouter::{Method, Response, StatusCode};
///
/// let mut table = RouteTable::new();
/// table
///     .mount("/items/{n:int64}", |_ctx| async { Ok(Response::new(StatusCode::Ok)) }, ["GET"])
///     .unwrap();
/// let dispatcher = Dispatcher::new(table, &WebserverConfig::default());
///
/// let call = dispatcher.resolve("/items/42", &Method::Get).unwrap();
/// assert_eq!(call.args().get_i64("n"), Some(42));
///
/// let err = dispatcher.resolve("/items/abc", &Method::Get).unwrap_err();
/// assert!(matches!(err, RouteError::NotFound { .. }));
/// ```
pub struct Dispatcher {
    table: RouteTable,
    mount_url: String,
}

impl Dispatcher {
    /// Freezes `table`. `webserver` supplies the address and prefix reported
    /// by [`log_routes`](Self::log_routes).
    pub fn new(table: RouteTable, webserver: &WebserverConfig) -> Self {
        Self {
            table,
            mount_url: webserver.mount_url(),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// URL the routes are served under, e.g. `http://127.0.0.1:44777/api/w`.
    pub fn mount_url(&self) -> &str {
        &self.mount_url
    }

    /// Finds the single route matching `path` and the handler for `method`.
    ///
    /// `path` is relative to the API prefix; leading, trailing and repeated
    /// slashes are ignored. Segments are percent-decoded before matching, and
    /// a path that does not decode cleanly is [`RouteError::NotFound`].
    ///
    /// # Errors
    ///
    /// - [`RouteError::NotFound`]: no route matches.
    /// - [`RouteError::AmbiguousRoute`]: more than one route matches.
    /// - [`RouteError::Coercion`]: a matched segment does not fit its native type.
    /// - [`RouteError::MethodNotAllowed`]: the route has no handler for `method`.
    pub fn resolve(&self, path: &str, method: &Method) -> Result<ResolvedCall, RouteError> {
        let Some(segments) = decode_path(path) else {
            return Err(RouteError::NotFound {
                path: path.to_owned(),
            });
        };
        let normalized = segments.join("/");
        let mut candidates = self
            .table
            .routes()
            .filter(|route| route.compiled().is_match(&normalized));

        let route = match (candidates.next(), candidates.next()) {
            (None, _) => {
                return Err(RouteError::NotFound {
                    path: path.to_owned(),
                });
            }
            (Some(route), None) => route,
            (Some(first), Some(second)) => {
                let candidates = [first, second]
                    .into_iter()
                    .chain(candidates)
                    .map(|route| route.template().to_owned())
                    .collect();
                return Err(RouteError::AmbiguousRoute {
                    path: path.to_owned(),
                    candidates,
                });
            }
        };

        let args = coerce_args(route, &segments)?;

        let Some(handler) = route.methods().get(method) else {
            return Err(RouteError::MethodNotAllowed {
                method: method.clone(),
                template: route.template().to_owned(),
                allowed: route.methods().methods().cloned().collect(),
            });
        };

        Ok(ResolvedCall {
            handler: Arc::clone(handler),
            args,
            template: Arc::from(route.template()),
        })
    }

    /// Routes `ctx` by `path` and its request method.
    ///
    /// On success the handler's result is returned unchanged. Routing failures
    /// are rendered by the error responder and returned as `Ok`, so the only
    /// `Err` this produces is one raised by a handler.
    pub async fn dispatch(&self, path: &str, ctx: Context) -> HandlerResult {
        let method = ctx.request().method().clone();
        debug!(method = %method, path, scheme = "http", "routing request");

        match self.resolve(path, &method) {
            Ok(call) => {
                debug!(method = %method, template = call.template(), "=> matched");
                call.invoke(ctx).await
            }
            Err(err) => {
                log_route_error(&err);
                Ok(responder::route_error(&err))
            }
        }
    }

    /// Logs every route, the working directory and the mount URL at `debug`.
    pub fn log_routes(&self) {
        debug!("routes:");
        for line in self.table.describe() {
            debug!("    - {line}");
        }
        if let Ok(cwd) = std::env::current_dir() {
            debug!(environment = %cwd.display(), "working directory");
        }
        debug!(url = %self.mount_url, "mounting routes");
    }
}

fn coerce_args(route: &CompiledRoute, segments: &[String]) -> Result<PathArgs, RouteError> {
    let mut args = PathArgs::new();

    for var in route.variables() {
        let raw = segments.get(var.index).map(String::as_str).unwrap_or_default();
        let value = var.kind.coerce(raw).ok_or_else(|| RouteError::Coercion {
            name: var.name.clone(),
            value: raw.to_owned(),
            kind: var.kind,
        })?;
        args.insert(var.name.clone(), value);
    }

    Ok(args)
}

fn log_route_error(err: &RouteError) {
    match err {
        RouteError::NotFound { path } => {
            debug!(path = %path, "=> matching error: {err}");
        }
        RouteError::MethodNotAllowed {
            method, template, ..
        } => {
            debug!(method = %method, template = %template, "=> matching error: {err}");
        }
        RouteError::AmbiguousRoute { path, candidates } => {
            warn!(path = %path, ?candidates, "ambiguous route: templates overlap");
        }
        RouteError::Coercion { name, value, kind } => {
            error!(name = %name, value = %value, kind = %kind, "path variable matched its pattern but failed to convert");
        }
    }
}

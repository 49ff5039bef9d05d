//! Request routing: typed path templates, mount-time route table, dispatch.
//!
//! Templates are `/`-delimited paths in which a segment of the form
//! `{name:type}` is a typed variable:
//!
//! | Template                  | Example path         | Named arguments       |
//! |---------------------------|----------------------|-----------------------|
//! | `/kng/list`               | `/kng/list`          | *(none)*              |
//! | `/kng/{kid:str}/details`  | `/kng/abc-1/details` | `kid → "abc-1"`       |
//! | `/items/{n:int64}`        | `/items/42`          | `n → 42_i64`          |
//! | `/points/{x:float64}`     | `/points/-0.5`       | `x → -0.5_f64`        |
//!
//! Routing has two phases. During the mount phase a [`RouteTable`] is built
//! with [`RouteTable::mount`]; mounting the same template again merges the
//! methods into the existing route. The table is then moved into a
//! [`Dispatcher`], which is immutable and can be shared across tasks.
//!
//! A path that matches more than one route is an error
//! ([`RouteError::AmbiguousRoute`]); there is no precedence between
//! overlapping templates.

use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::http::Response;

pub mod dispatcher;
pub mod error;
pub mod methods;
pub mod table;
pub mod template;
pub mod types;

pub use dispatcher::{Dispatcher, ResolvedCall};
pub use error::{ConfigError, RouteError};
pub use methods::MethodTable;
pub use table::{CompiledRoute, RouteTable};
pub use template::{CompiledTemplate, PathVariable};
pub use types::{PathArgs, PathValue, VarType};

/// Error type handlers may fail with. The front controller turns it into a
/// `500 Internal Server Error`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a handler produces.
pub type HandlerResult = Result<Response, BoxError>;

/// Boxed future returned by a [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Type-erased async handler.
///
/// A handler receives a [`Context`] whose [`args`](Context::args) hold the
/// coerced path variables, and returns a [`HandlerResult`]. Handlers are kept
/// behind an `Arc` so a single handler can serve several methods and routes.
pub type Handler = Arc<dyn Fn(Context) -> HandlerFuture + Send + Sync + 'static>;

/// Erases an async function or closure into a [`Handler`].
///
/// # Examples
///
/// ```rust
/// use pathrouter::router::{handler, Handler};
/// use pathrouter::{Response, StatusCode};
///
/// let ping: Handler = handler(|_ctx| async { Ok(Response::new(StatusCode::NoContent)) });
/// ```
pub fn handler<H, F>(f: H) -> Handler
where
    H: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: Context| -> HandlerFuture { Box::pin(f(ctx)) })
}

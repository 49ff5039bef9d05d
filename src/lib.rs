//! # pathrouter
//!
//! Typed template path routing behind an async HTTP/1.1 front controller.
//!
//! Routes are declared as templates such as `/kng/{kid:str}/details` or
//! `/items/{n:int64}`. Each `{name:type}` segment is matched against the
//! type's pattern and handed to the handler as a native value.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pathrouter::config::WebserverConfig;
//! use pathrouter::gateway::Gateway;
//! use pathrouter::router::{Dispatcher, RouteTable};
//! use pathrouter::{Response, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let webserver = WebserverConfig::default();
//!
//!     let mut table = RouteTable::new();
//!     table.mount(
//!         "/items/{n:int64}",
//!         |ctx| async move {
//!             let n = ctx.args().get_i64("n").unwrap_or_default();
//!             Ok(Response::new(StatusCode::Ok).body(format!("item {n}")))
//!         },
//!         ["GET"],
//!     )?;
//!
//!     let dispatcher = Arc::new(Dispatcher::new(table, &webserver));
//!     let server = Server::bind(webserver.bind_address()).await?;
//!     Gateway::new(dispatcher, &webserver).serve(server).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod security;
pub mod server;

pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::{
    BoxError, ConfigError, Dispatcher, HandlerResult, PathArgs, PathValue, RouteError, RouteTable,
    VarType,
};
pub use server::{Server, ServerError};

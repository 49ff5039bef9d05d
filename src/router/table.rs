//! Route table: the mount phase.

use tracing::debug;

use super::error::ConfigError;
use super::methods::MethodTable;
use super::template::{CompiledTemplate, PathVariable};
use super::{Context, Handler, HandlerResult, handler};
use crate::http::Method;

/// A compiled template together with its method table.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    template: CompiledTemplate,
    methods: MethodTable,
}

impl CompiledRoute {
    fn new(template: CompiledTemplate) -> Self {
        Self {
            template,
            methods: MethodTable::new(),
        }
    }

    /// Template text of the first mount that created this route.
    pub fn template(&self) -> &str {
        self.template.text()
    }

    pub fn compiled(&self) -> &CompiledTemplate {
        &self.template
    }

    pub fn variables(&self) -> &[PathVariable] {
        self.template.variables()
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// `"<template> <METHOD>,<METHOD>"`, the line used in startup logs.
    pub fn describe(&self) -> String {
        let methods: Vec<&str> = self.methods.methods().map(Method::as_str).collect();
        format!("{} {}", self.template(), methods.join(","))
    }
}

/// Every route mounted so far, in mount order.
///
/// Routes are kept in a list and compared by matcher source, so two templates
/// that differ only in slashes or variable names share one entry.
///
/// # Examples
///
/// ```rust
/// use pathrouter::router::RouteTable;
/// use pathrouter::{Response, StatusCode};
///
/// let mut table = RouteTable::new();
/// table
///     .mount("/kng/{kid:str}/details", |_ctx| async { Ok(Response::new(StatusCode::Ok)) }, ["GET"])
///     .unwrap();
/// table
///     .mount("/kng/{kid:str}/details", |_ctx| async { Ok(Response::new(StatusCode::Accepted)) }, ["POST"])
///     .unwrap();
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.describe(), vec!["/kng/{kid:str}/details GET,POST"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `handler` on `template` for every method in `methods`.
    ///
    /// Method names are matched exactly against `GET`, `POST`, `PUT`,
    /// `DELETE` and `PATCH`. All names are validated before anything is
    /// registered, so a failed mount leaves the table untouched.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnsupportedMethod`] for any other method name.
    /// - [`ConfigError::InvalidTemplate`] if the template does not compile.
    pub fn mount<H, F, I, S>(&mut self, template: &str, handler_fn: H, methods: I) -> Result<(), ConfigError>
    where
        H: Fn(Context) -> F + Send + Sync + 'static,
        F: Future<Output = HandlerResult> + Send + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mount_handler(template, handler(handler_fn), methods)
    }

    /// Like [`mount`](Self::mount) for an already type-erased [`Handler`].
    pub fn mount_handler<I, S>(&mut self, template: &str, handler: Handler, methods: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let methods = methods
            .into_iter()
            .map(|name| parse_method(name.as_ref(), template))
            .collect::<Result<Vec<_>, _>>()?;
        let compiled = CompiledTemplate::compile(template)?;

        let index = match self
            .routes
            .iter()
            .position(|route| route.template.same_matcher(&compiled))
        {
            Some(index) => index,
            None => {
                self.routes.push(CompiledRoute::new(compiled));
                self.routes.len() - 1
            }
        };

        let route = &mut self.routes[index];
        for method in methods {
            debug!(method = %method, template, "mounting route");
            route.methods.register(method, handler.clone());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }

    /// Template texts of all routes.
    pub fn templates(&self) -> Vec<&str> {
        self.routes.iter().map(CompiledRoute::template).collect()
    }

    /// One `"<template> <METHODS>"` line per route.
    pub fn describe(&self) -> Vec<String> {
        self.routes.iter().map(CompiledRoute::describe).collect()
    }
}

fn parse_method(name: &str, template: &str) -> Result<Method, ConfigError> {
    let method: Method = name.parse().unwrap_or_else(|never| match never {});
    if method.is_routable() {
        Ok(method)
    } else {
        Err(ConfigError::UnsupportedMethod {
            method: name.to_owned(),
            template: template.to_owned(),
        })
    }
}

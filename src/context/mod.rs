//! Per-request context handed through middleware to the matched handler.

use std::sync::Arc;

use crate::Request;
use crate::router::PathArgs;

/// A request plus what routing learned about it.
///
/// Middleware sees the context before routing, with empty [`args`](Self::args)
/// and no [`template`](Self::template). The dispatcher fills both in right
/// before the handler is called.
#[derive(Debug)]
pub struct Context {
    request: Request,
    args: PathArgs,
    template: Option<Arc<str>>,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            args: PathArgs::new(),
            template: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Coerced path variables of the matched route.
    pub fn args(&self) -> &PathArgs {
        &self.args
    }

    /// Template of the matched route, once routed.
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Deserializes the request body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(self.request.body())
    }

    pub(crate) fn bind(&mut self, args: PathArgs, template: Arc<str>) {
        self.args = args;
        self.template = Some(template);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;
    use crate::router::PathValue;

    #[test]
    fn fresh_context_is_unrouted() {
        let ctx = Context::new(Request::new(Method::Get, "/kng/list"));
        assert!(ctx.args().is_empty());
        assert_eq!(ctx.template(), None);
        assert_eq!(ctx.request().path(), "/kng/list");
    }

    #[test]
    fn bind_sets_args_and_template() {
        let mut ctx = Context::new(Request::new(Method::Get, "/items/1"));
        let mut args = PathArgs::new();
        args.insert("n", PathValue::Int(1));
        ctx.bind(args, Arc::from("/items/{n:int64}"));
        assert_eq!(ctx.args().get_i64("n"), Some(1));
        assert_eq!(ctx.template(), Some("/items/{n:int64}"));
    }

    #[test]
    fn json_body() {
        let raw = b"POST /kng/1/create HTTP/1.1\r\nContent-Length: 12\r\n\r\n{\"name\":\"x\"}";
        let (request, _) = Request::parse(raw).unwrap();
        let ctx = Context::new(request);
        let body: serde_json::Value = ctx.json().unwrap();
        assert_eq!(body["name"], "x");
    }
}

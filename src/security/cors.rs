//! Cross-Origin Resource Sharing for the front controller.

use crate::{
    Method, Response, StatusCode,
    context::Context,
    middleware::{Middleware, MiddlewareFuture, Next},
};

/// CORS middleware: validates the `Origin` header, answers preflight
/// requests, and adds `Access-Control-*` headers to actual responses.
///
/// # Behavior
///
/// - Without an `Origin` header, or with an origin outside the allow-list, the
///   request passes through unmodified.
/// - `OPTIONS` requests are preflights: they are answered with `204 No Content`
///   and never reach the router (which does not route `OPTIONS`).
/// - Other requests run normally and get the CORS headers appended.
/// - `Vary: Origin` is added only when a specific origin is echoed back.
///
/// The allowed methods are the routable ones (`GET`, `POST`, `PUT`, `DELETE`,
/// `PATCH`).
///
/// # Examples
///
/// ```rust
/// use pathrouter::security::CorsMiddleware;
///
/// let cors = CorsMiddleware::with_origins(["https://app.example.com"])
///     .allow_header("X-Request-ID");
/// ```
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allow_methods: String,
    allowed_headers: Vec<String>,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl CorsMiddleware {
    /// Allows every origin (`*`) with `Content-Type` and `Authorization` headers.
    pub fn new() -> Self {
        Self::with_origins(["*"])
    }

    /// Allows exactly `origins`. An empty list disables CORS headers entirely.
    pub fn with_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allow_methods = Method::ROUTABLE
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
            allow_methods,
            allowed_headers: vec!["Content-Type".to_owned(), "Authorization".to_owned()],
        }
    }

    /// Adds an allowed request header.
    #[must_use]
    pub fn allow_header(mut self, header: impl Into<String>) -> Self {
        self.allowed_headers.push(header.into());
        self
    }

    fn allow_origin_for(&self, origin: &str) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            Some("*".to_owned())
        } else if self.allowed_origins.iter().any(|o| o == origin) {
            Some(origin.to_owned())
        } else {
            None
        }
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> MiddlewareFuture {
        let allow_origin = ctx
            .request()
            .headers()
            .get("origin")
            .and_then(|origin| self.allow_origin_for(origin));
        let Some(allow_origin) = allow_origin else {
            return Box::pin(next.run(ctx));
        };

        let is_preflight = ctx.request().method() == &Method::Options;
        let allow_methods = self.allow_methods.clone();
        let allow_headers = self.allowed_headers.join(", ");

        Box::pin(async move {
            let vary = allow_origin != "*";

            let mut resp = if is_preflight {
                Response::new(StatusCode::NoContent).header("Access-Control-Max-Age", "3600")
            } else {
                next.run(ctx).await
            };

            resp.add_header("Access-Control-Allow-Origin", allow_origin);
            resp.add_header("Access-Control-Allow-Methods", allow_methods);
            resp.add_header("Access-Control-Allow-Headers", allow_headers);
            if vary {
                resp.add_header("Vary", "Origin");
            }
            resp
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::Request;
    use crate::middleware::{MiddlewareHandler, from_middleware};

    fn chain(cors: CorsMiddleware) -> Arc<[MiddlewareHandler]> {
        let endpoint: MiddlewareHandler = Arc::new(|_ctx: Context, _next: Next| -> MiddlewareFuture {
            Box::pin(async { Response::new(StatusCode::Ok) })
        });
        Arc::from(vec![from_middleware(Arc::new(cors)), endpoint])
    }

    async fn run(cors: CorsMiddleware, request: Request) -> Response {
        Next::new(chain(cors)).run(Context::new(request)).await
    }

    #[tokio::test]
    async fn no_origin_passes_through() {
        let res = run(CorsMiddleware::new(), Request::new(Method::Get, "/")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert!(!res.headers().contains("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn wildcard_origin() {
        let req = Request::new(Method::Get, "/").with_header("Origin", "https://a.example");
        let res = run(CorsMiddleware::new(), req).await;
        assert_eq!(res.headers().get("access-control-allow-origin"), Some("*"));
        assert_eq!(
            res.headers().get("access-control-allow-methods"),
            Some("GET, POST, PUT, DELETE, PATCH")
        );
        assert!(!res.headers().contains("vary"));
    }

    #[tokio::test]
    async fn specific_origin_is_echoed_with_vary() {
        let cors = CorsMiddleware::with_origins(["https://a.example"]);
        let req = Request::new(Method::Get, "/").with_header("Origin", "https://a.example");
        let res = run(cors, req).await;
        assert_eq!(
            res.headers().get("access-control-allow-origin"),
            Some("https://a.example")
        );
        assert_eq!(res.headers().get("vary"), Some("Origin"));
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_headers() {
        let cors = CorsMiddleware::with_origins(["https://a.example"]);
        let req = Request::new(Method::Get, "/").with_header("Origin", "https://evil.example");
        let res = run(cors, req).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert!(!res.headers().contains("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn preflight_short_circuits() {
        let req = Request::new(Method::Options, "/kng/list")
            .with_header("Origin", "https://a.example");
        let res = run(CorsMiddleware::new().allow_header("X-Request-ID"), req).await;
        assert_eq!(res.status(), StatusCode::NoContent);
        assert_eq!(res.headers().get("access-control-max-age"), Some("3600"));
        assert_eq!(
            res.headers().get("access-control-allow-headers"),
            Some("Content-Type, Authorization, X-Request-ID")
        );
    }
}

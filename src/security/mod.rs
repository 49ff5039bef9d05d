//! Security middleware.

mod cors;

pub use cors::CorsMiddleware;

//! HTTP API for the storefront: router, middleware, and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;

//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, mail clients and the tax rate shared by handlers
//! - `routes/`: HTTP routes + handlers (one file per storefront area)
//! - `dto.rs`: request bodies and their validation
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use storefront_auth::Hs256JwtValidator;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Storefront routes live under `base_path` (e.g. `/api`); `/health` stays at
/// the root.
pub fn build_app(services: Arc<AppServices>, jwt_secret: &str, base_path: &str) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Anonymous callers allowed, viewer attached when the token is valid.
    let optional = routes::viewer_router().layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::viewer_middleware,
    ));

    // Protected routes: require a valid bearer token.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = routes::public_router()
        .merge(optional)
        .merge(protected)
        .layer(Extension(services));

    let root = Router::new().route("/health", get(routes::system::health));
    let root = match base_path.trim_matches('/') {
        "" => root.merge(api),
        prefix => root.nest(&format!("/{prefix}"), api),
    };

    root.layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::log_requests)))
}

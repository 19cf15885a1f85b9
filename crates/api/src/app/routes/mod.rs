use axum::{Extension, Router};

use storefront_auth::{authorize, Principal, Role};
use storefront_core::UserId;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub mod brands;
pub mod cart;
pub mod categories;
pub mod contact;
pub mod newsletter;
pub mod orders;
pub mod products;
pub mod system;

/// Endpoints open to anyone.
pub fn public_router() -> Router {
    Router::new()
        .nest("/product", products::public())
        .nest("/brand", brands::public())
        .nest("/category", categories::public())
        .nest("/newsletter", newsletter::public())
        .nest("/contact", contact::public())
}

/// Endpoints that personalise their answer when a viewer is known.
pub fn viewer_router() -> Router {
    Router::new().nest("/product", products::viewer())
}

/// Endpoints that require a bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", axum::routing::get(system::whoami))
        .nest("/product", products::protected())
        .nest("/brand", brands::protected())
        .nest("/category", categories::protected())
        .nest("/cart", cart::protected())
        .nest("/order", orders::protected())
}

pub(crate) fn viewer_id(viewer: Option<Extension<PrincipalContext>>) -> Option<UserId> {
    viewer.map(|Extension(ctx)| ctx.user_id())
}

pub(crate) fn require_role<'a>(ctx: &'a PrincipalContext, allowed: &[Role]) -> Result<&'a Principal, ApiError> {
    Ok(authorize(Some(ctx.principal()), allowed)?)
}

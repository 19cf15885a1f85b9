use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use storefront_core::{CartId, LineItemId, ProductId};
use storefront_sales::{price_cart_items, price_item, stock_adjustments, Cart};

use crate::app::dto::{AddCartItemRequest, CreateCartRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn protected() -> Router {
    Router::new()
        .route("/add", post(create_cart))
        .route("/add/:cart_id", post(add_item))
        .route("/delete/:cart_id", delete(delete_cart))
        .route("/delete/:cart_id/:product_id", delete(remove_product))
}

fn cart_not_found() -> ApiError {
    ApiError::not_found("cart not found")
}

/// Load a cart the caller owns (admins may touch any cart).
async fn owned_cart(services: &AppServices, principal: &PrincipalContext, raw_id: &str) -> Result<Cart, ApiError> {
    let id: CartId = raw_id.parse().map_err(|_| cart_not_found())?;
    let cart = services.carts.cart(id).await?.ok_or_else(cart_not_found)?;
    if !principal.is_admin() && !cart.is_owned_by(principal.user_id()) {
        return Err(ApiError::Forbidden("cart belongs to another user".into()));
    }
    Ok(cart)
}

/// Price the items, persist the cart, then take the quantities out of stock.
#[tracing::instrument(skip_all, fields(user = %principal.user_id()))]
pub async fn create_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    for item in &body.products {
        item.validate()?;
    }

    let items = price_cart_items(&body.products, services.tax_rate)?;
    let cart = Cart::new(CartId::new(), principal.user_id(), items, Utc::now());
    let cart_id = cart.id;
    let adjustments = stock_adjustments(&cart.products);

    services.carts.insert_cart(cart).await?;

    // The cart is already saved; a failed decrement is logged, not rolled back.
    if let Err(err) = services.catalog.adjust_stock(&adjustments).await {
        tracing::error!(cart = %cart_id, error = %err, "stock decrement failed");
    }

    tracing::info!(cart = %cart_id, lines = adjustments.len(), "cart created");
    Ok(Json(json!({ "success": true, "cartId": cart_id })))
}

pub async fn delete_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(cart_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = owned_cart(&services, &principal, &cart_id).await?;
    services.carts.delete_cart(cart.id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(cart_id): Path<String>,
    Json(body): Json<AddCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.product.validate()?;

    let mut cart = owned_cart(&services, &principal, &cart_id).await?;
    let line = price_item(LineItemId::new(), &body.product, services.tax_rate)?;
    cart.push_item(line, Utc::now());
    services.carts.save_cart(cart).await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn remove_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((cart_id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let product: ProductId = product_id
        .parse()
        .map_err(|_| ApiError::bad_request("malformed product id"))?;

    let mut cart = owned_cart(&services, &principal, &cart_id).await?;
    if cart.remove_product(product, Utc::now()) > 0 {
        services.carts.save_cart(cart).await?;
    }

    Ok(Json(json!({ "success": true })))
}

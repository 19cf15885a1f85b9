use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use storefront_core::{LineItemId, OrderId};
use storefront_infra::external::EmailTemplate;
use storefront_sales::{compute_order_tax, sort_newest_first, Order, TaxedOrder};

use crate::app::dto::{OrderSearchParams, PlaceOrderRequest, UpdateItemStatusRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn protected() -> Router {
    Router::new()
        .route("/", get(list_orders))
        .route("/add", post(place_order))
        .route("/search", get(search_orders))
        .route("/:order_id", get(get_order))
        .route("/cancel/:order_id", delete(cancel_order))
        .route("/status/item/:item_id", put(update_item_status))
}

fn order_not_found() -> ApiError {
    ApiError::not_found("order not found")
}

/// Attach each order's cart items and recompute its totals, newest first.
///
/// Orders whose cart no longer exists are dropped.
async fn with_tax(services: &AppServices, orders: Vec<Order>) -> Result<Vec<TaxedOrder>, ApiError> {
    let mut taxed = Vec::with_capacity(orders.len());
    for order in orders {
        match services.carts.cart(order.cart).await? {
            Some(cart) => taxed.push(compute_order_tax(order.with_items(cart.products))),
            None => tracing::debug!(order = %order.id, cart = %order.cart, "order without cart skipped"),
        }
    }
    sort_newest_first(&mut taxed);
    Ok(taxed)
}

#[tracing::instrument(skip_all, fields(user = %principal.user_id()))]
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = services
        .carts
        .cart(body.cart_id()?)
        .await?
        .ok_or_else(|| ApiError::not_found("cart not found"))?;
    if !principal.is_admin() && !cart.is_owned_by(principal.user_id()) {
        return Err(ApiError::Forbidden("cart belongs to another user".into()));
    }

    let order = Order {
        id: OrderId::new(),
        cart: cart.id,
        user: principal.user_id(),
        total: body.total,
        created: Utc::now(),
    };
    services.orders.insert_order(order.clone()).await?;
    tracing::info!(order = %order.id, cart = %cart.id, "order placed");

    let template = EmailTemplate::OrderConfirmation {
        order: order.id,
        name: None,
    };
    if let Err(err) = services.mailer.send(principal.email(), template).await {
        tracing::warn!(order = %order.id, error = %err, "order confirmation email not sent");
    }

    Ok(Json(json!({
        "success": true,
        "message": "order has been placed successfully",
        "savedOrder": order,
    })))
}

/// Look an order up by id. A malformed id yields no results.
pub async fn search_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<OrderSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let Ok(id) = params.search.trim().parse::<OrderId>() else {
        return Ok(Json(json!({ "orders": [] })));
    };

    let found: Vec<Order> = services
        .orders
        .order(id)
        .await?
        .into_iter()
        .filter(|o| o.visible_to(principal.user_id(), principal.is_admin()))
        .collect();

    let orders = with_tax(&services, found).await?;
    Ok(Json(json!({ "orders": orders })))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = (!principal.is_admin()).then(|| principal.user_id());
    let found = services.orders.orders(scope).await?;
    let orders = with_tax(&services, found).await?;
    Ok(Json(json!({ "orders": orders })))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: OrderId = order_id.parse().map_err(|_| order_not_found())?;
    let order = services
        .orders
        .order(id)
        .await?
        .filter(|o| o.visible_to(principal.user_id(), principal.is_admin()))
        .ok_or_else(order_not_found)?;

    let order = with_tax(&services, vec![order])
        .await?
        .pop()
        .ok_or_else(order_not_found)?;
    Ok(Json(json!({ "order": order })))
}

/// Remove an order. The cart is left in place.
pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: OrderId = order_id.parse().map_err(|_| order_not_found())?;
    let order = services
        .orders
        .order(id)
        .await?
        .filter(|o| o.visible_to(principal.user_id(), principal.is_admin()))
        .ok_or_else(order_not_found)?;

    services.orders.delete_order(order.id).await?;
    tracing::info!(order = %order.id, "order cancelled");
    Ok(Json(json!({ "success": true })))
}

/// Owners may cancel a line item; admins may set any status.
pub async fn update_item_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(item_id): Path<String>,
    Json(body): Json<UpdateItemStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = body.status()?;
    let not_found = || ApiError::not_found("item not found");
    let item: LineItemId = item_id.parse().map_err(|_| not_found())?;

    let mut cart = services.carts.cart_with_item(item).await?.ok_or_else(not_found)?;
    if !principal.is_admin() && !cart.is_owned_by(principal.user_id()) {
        return Err(ApiError::Forbidden("item belongs to another user".into()));
    }

    let line = cart
        .update_item_status(item, status, principal.is_admin(), Utc::now())?
        .clone();
    services.carts.save_cart(cart).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("item status has been updated to {status}"),
        "item": line,
    })))
}

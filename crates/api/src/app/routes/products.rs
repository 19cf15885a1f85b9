use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use storefront_auth::Role;
use storefront_catalog::{brand_listing, product_by_slug, run_listing, search_by_name, NewProduct};
use storefront_core::ProductId;

use crate::app::dto::ListingRequest;
use crate::app::errors::ApiError;
use crate::app::routes::{require_role, viewer_id};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public() -> Router {
    Router::new()
        .route("/item/:slug", get(product_by_slug_handler))
        .route("/list/search/:name", get(search_products))
}

pub fn viewer() -> Router {
    Router::new()
        .route("/list", post(list_products))
        .route("/list/brand/:slug", get(list_brand_products))
}

pub fn protected() -> Router {
    Router::new().route("/add", post(add_product))
}

/// Filtered, sorted, paginated storefront listing.
#[tracing::instrument(skip_all, fields(page = tracing::field::Empty))]
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    viewer: Option<Extension<PrincipalContext>>,
    Json(body): Json<ListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = body.into_query()?;
    tracing::Span::current().record("page", query.page);

    let snapshot = services
        .catalog
        .listing_snapshot(viewer_id(viewer), query.category.as_deref())
        .await?;
    let page = run_listing(&query, snapshot);

    Ok(Json(page))
}

pub async fn product_by_slug_handler(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let products = services.catalog.products().await?;
    let brands = services.catalog.brands().await?;
    let product = product_by_slug(&slug, &products, &brands)?;
    Ok(Json(json!({ "product": product })))
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let products = services.catalog.products().await?;
    let hits = search_by_name(&name, &products)?;
    Ok(Json(json!({ "products": hits })))
}

pub async fn list_brand_products(
    Extension(services): Extension<Arc<AppServices>>,
    viewer: Option<Extension<PrincipalContext>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = viewer_id(viewer);
    let brands = services.catalog.brands().await?;
    let products = services.catalog.products().await?;
    let wishlist = match viewer {
        Some(user) => services.catalog.wishlist_of(user).await?,
        None => Vec::new(),
    };

    let listing = brand_listing(&slug, &brands, &products, viewer, &wishlist)?;
    Ok(Json(listing))
}

pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&principal, &[Role::Admin, Role::Merchant])?;

    let product = body.into_product(ProductId::new(), Utc::now())?;
    services.catalog.insert_product(product.clone()).await?;
    tracing::info!(product = %product.id, sku = %product.sku, "product created");

    Ok(Json(json!({
        "success": true,
        "message": "Product has been created successfully",
        "product": product,
    })))
}

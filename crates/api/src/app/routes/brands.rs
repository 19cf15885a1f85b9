use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use storefront_auth::Role;
use storefront_catalog::{visibility, Brand, NewBrand};
use storefront_core::BrandId;

use crate::app::dto::BrandActiveRequest;
use crate::app::errors::ApiError;
use crate::app::routes::require_role;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public() -> Router {
    Router::new()
        .route("/list", get(list_active_brands))
        .route("/:id", get(get_brand))
}

pub fn protected() -> Router {
    Router::new()
        .route("/add", post(add_brand))
        .route("/:id/active", put(set_brand_active))
}

pub async fn list_active_brands(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    let brands: Vec<Brand> = services
        .catalog
        .brands()
        .await?
        .into_iter()
        .filter(|b| b.is_active)
        .collect();
    Ok(Json(json!({ "brands": brands })))
}

pub async fn get_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || ApiError::not_found(format!("the brand with {id} is not found"));

    let brand_id: BrandId = id.parse().map_err(|_| not_found())?;
    let brand = services.catalog.brand(brand_id).await?.ok_or_else(not_found)?;
    Ok(Json(json!({ "brand": brand })))
}

pub async fn add_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewBrand>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&principal, &[Role::Admin])?;

    let brand = body.into_brand(BrandId::new(), Utc::now())?;
    services.catalog.insert_brand(brand.clone()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "the brand has been added successfully",
        "brand": brand,
    })))
}

/// Toggle a brand; switching it off also deactivates all of its products.
///
/// Merchants may only toggle their own brands.
pub async fn set_brand_active(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<BrandActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_role(&principal, &[Role::Admin, Role::Merchant])?;

    let not_found = || ApiError::not_found(format!("the brand with {id} is not found"));
    let brand_id: BrandId = id.parse().map_err(|_| not_found())?;
    let brand = services.catalog.brand(brand_id).await?.ok_or_else(not_found)?;

    if caller.role == Role::Merchant && (caller.merchant.is_none() || brand.merchant != caller.merchant) {
        return Err(ApiError::Forbidden("brand belongs to another merchant".into()));
    }

    if !body.brand.is_active {
        let products = services.catalog.products().await?;
        let affected = visibility::products_of_brand(brand_id, &products);
        services.catalog.deactivate_products(&affected).await?;
        tracing::info!(brand = %brand_id, products = affected.len(), "brand deactivated");
    }

    let updated = services
        .catalog
        .set_brand_active(brand_id, body.brand.is_active)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "brand has been updated successfully",
        "updatedBrand": updated,
    })))
}

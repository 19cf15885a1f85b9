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
use storefront_catalog::{visibility, Category, NewCategory};
use storefront_core::CategoryId;

use crate::app::dto::CategoryActiveRequest;
use crate::app::errors::ApiError;
use crate::app::routes::require_role;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn public() -> Router {
    Router::new()
        .route("/list", get(list_active_categories))
        .route("/:id", get(get_category))
}

pub fn protected() -> Router {
    Router::new()
        .route("/add", post(add_category))
        .route("/:id/active", put(set_category_active))
}

pub async fn list_active_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    let categories: Vec<Category> = services
        .catalog
        .categories()
        .await?
        .into_iter()
        .filter(|c| c.is_active)
        .collect();
    Ok(Json(json!({ "categories": categories })))
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || ApiError::not_found("cannot find the category");

    let category_id: CategoryId = id.parse().map_err(|_| not_found())?;
    let category = services
        .catalog
        .category(category_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(json!({ "category": category })))
}

pub async fn add_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&principal, &[Role::Admin])?;

    let category = body.into_category(CategoryId::new(), Utc::now())?;
    services.catalog.insert_category(category.clone()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Category has been added successfully",
        "addedCategory": category,
    })))
}

pub async fn set_category_active(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<CategoryActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&principal, &[Role::Admin])?;

    let not_found = || ApiError::not_found("cannot find the category");
    let category_id: CategoryId = id.parse().map_err(|_| not_found())?;
    let category = services
        .catalog
        .category(category_id)
        .await?
        .ok_or_else(not_found)?;

    if !body.category.is_active {
        // Computed from the record before the flag flips.
        let affected = visibility::products_of_category(&category);
        services.catalog.deactivate_products(&affected).await?;
        tracing::info!(category = %category_id, products = affected.len(), "category deactivated");
    }

    let updated = services
        .catalog
        .set_category_active(category_id, body.category.is_active)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "category has been updated successfully",
        "updatedCategory": updated,
    })))
}

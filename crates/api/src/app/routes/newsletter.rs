use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::post, Json, Router};
use serde_json::json;

use storefront_infra::external::EmailTemplate;

use crate::app::dto::{required, SubscribeRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn public() -> Router {
    Router::new().route("/subscribe", post(subscribe))
}

/// Add the address to the mailing list, then send the welcome email.
pub async fn subscribe(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = required(body.email, "email is missing")?;

    services.mailing_list.subscribe(&email).await?;
    services
        .mailer
        .send(&email, EmailTemplate::NewsletterSubscription)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "You have successfully subscribed to the newsletter",
    })))
}

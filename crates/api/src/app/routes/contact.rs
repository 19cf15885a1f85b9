use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::post, Json, Router};
use chrono::Utc;
use serde_json::json;

use storefront_core::ContactId;
use storefront_infra::external::EmailTemplate;
use storefront_infra::Contact;

use crate::app::dto::{required, ContactRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn public() -> Router {
    Router::new().route("/add", post(add_contact))
}

pub async fn add_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = Contact {
        id: ContactId::new(),
        name: required(body.name, "name is required")?,
        email: required(body.email, "email is required")?,
        message: required(body.message, "message is required")?,
        created: Utc::now(),
    };

    services.contacts.insert_contact(contact.clone()).await?;

    if let Err(err) = services.mailer.send(&contact.email, EmailTemplate::Contact).await {
        tracing::warn!(contact = %contact.id, error = %err, "contact acknowledgement not sent");
    }

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "we received your message, we will reach you via your email address {}",
            contact.email
        ),
        "contact": contact,
    })))
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use storefront_auth::AuthzError;
use storefront_core::DomainError;
use storefront_infra::external::ExternalError;
use storefront_infra::StoreError;

/// Every failure a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    External(#[from] ExternalError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::BadRequest(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            AuthzError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Unauthorized(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Store(StoreError::Conflict(msg)) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Store(StoreError::NotFound(msg)) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal server error")
            }
            ApiError::External(ExternalError::Rejected { service, status, detail }) if (400..500).contains(&status) => {
                tracing::warn!(service, status, detail = %detail, "external service rejected request");
                json_error(StatusCode::BAD_REQUEST, "external_rejected", detail)
            }
            ApiError::External(err) => {
                tracing::error!(error = %err, "external service failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "external_error", "external service error")
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use storefront_auth::Role;

    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_of(DomainError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::invalid_id("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(DomainError::conflict("x")), StatusCode::CONFLICT);
        assert_eq!(status_of(AuthzError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthzError::Forbidden(Role::Member)), StatusCode::FORBIDDEN);
        assert_eq!(status_of(StoreError::Conflict("sku".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(StoreError::Unavailable("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ExternalError::Rejected {
                service: "mailchimp",
                status: 400,
                detail: "already a member".into(),
            }),
            StatusCode::BAD_REQUEST
        );
    }
}

//! Error types for the back-office API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use document_service::ServiceError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing X-User-Id header")]
    Unauthorized,

    #[error("Unknown document family: {0}")]
    UnknownFamily(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Template content is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::UnknownFamily(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Service(err) => service_status(err),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured violation list for validation failures
    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Service(ServiceError::Schema(err)) => serde_json::to_value(err).ok(),
            ApiError::Service(ServiceError::Values(err)) => {
                serde_json::to_value(&err.violations).ok()
            }
            _ => None,
        }
    }
}

fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Schema(_)
        | ServiceError::Values(_)
        | ServiceError::ReservedTemplateName(_)
        | ServiceError::EmptyTemplateName
        | ServiceError::InvalidClient { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::NotFound { .. } | ServiceError::ClientNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::ImmutableTemplate => StatusCode::FORBIDDEN,
        ServiceError::DuplicateTemplateName(_)
        | ServiceError::DuplicateClientEmail(_)
        | ServiceError::NotEditable { .. }
        | ServiceError::InvalidTransition { .. }
        | ServiceError::ConcurrentUpdate { .. } => StatusCode::CONFLICT,
        ServiceError::Store(_) | ServiceError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("Internal error: {}", self);
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "error": message,
            "status": status.as_u16(),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

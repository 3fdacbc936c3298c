use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::{
    config::{config_loader, stage::Stage},
    usecases::{
        gateway_webhooks::WebhookError, quota::QuotaError,
        subscription_lifecycle::SubscriptionError,
    },
};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const GATEWAY_ERROR_MESSAGE: &str = "Payment provider is unavailable, please retry";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message: message.into(),
    });
    (status, body).into_response()
}

/// Body text for a subscription failure. Gateway details are shown outside
/// production only; storage failures never leak.
pub fn subscription_error_message(err: &SubscriptionError, stage: Stage) -> String {
    match err {
        SubscriptionError::Gateway(_) if stage.is_production() => GATEWAY_ERROR_MESSAGE.to_string(),
        SubscriptionError::Gateway(gateway) => gateway.detail(),
        SubscriptionError::Storage(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        let message = subscription_error_message(&self, config_loader::get_stage());
        error_response(self.status_code(), message)
    }
}

impl IntoResponse for QuotaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            QuotaError::Storage(_) => error_response(status, INTERNAL_ERROR_MESSAGE),
            QuotaError::QuotaExceeded {
                requested,
                remaining,
            } => (
                status,
                Json(json!({
                    "code": status.as_u16(),
                    "message": "Listing quota exceeded",
                    "requested": requested,
                    "remaining": remaining,
                })),
            )
                .into_response(),
            other => error_response(status, other.to_string()),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            WebhookError::MissingEventType => error_response(status, self.to_string()),
            WebhookError::Storage(_) => {
                (status, Json(json!({ "status": "not processed" }))).into_response()
            }
        }
    }
}

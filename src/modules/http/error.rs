use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde::Serialize;

use crate::modules::accounts::error::AccountError;

/// Every error response carries a single `message`
#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl AccountError {
    /// Status code and client-safe message; internal details stay in the log
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AccountError::Validation(message) | AccountError::Conflict(message) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            AccountError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            AccountError::InvalidCredentials => (StatusCode::BAD_REQUEST, self.to_string()),
            AccountError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            AccountError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AccountError::Notification { .. } => (
                StatusCode::BAD_GATEWAY,
                "The account was saved but the notification email could not be sent".to_string(),
            ),
            AccountError::Store(_) | AccountError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), message);
        }
        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<JsonRejection> for AccountError {
    fn from(rejection: JsonRejection) -> Self {
        AccountError::Validation(rejection.body_text())
    }
}

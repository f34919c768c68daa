// HTTP error types for the JSON API and the rendered pages
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::auth::{SessionError, TokenError};
use crate::database::models::ValidationError;
use crate::database::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError { field: String, reason: String },
    InvalidJson(String),
    InvalidToken(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::InvalidJson(_)
            | ApiError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationError { field, reason } => format!("{}: {}", field, reason),
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::InvalidToken(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg) => msg.clone(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.message(),
            "code": self.error_code(),
        });

        if let ApiError::ValidationError { field, reason } = self {
            body["field"] = json!(field);
            body["reason"] = json!(reason);
        }

        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        ApiError::InvalidToken(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation_error(err.field, err.reason)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(format!("{} not found", msg)),
            StoreError::AlreadyExists(msg) => ApiError::bad_request(format!("{} already exists", msg)),
            StoreError::Validation(v) => v.into(),
            StoreError::Hashing(msg) => {
                tracing::error!("Password hashing error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => ApiError::invalid_token("invalid token"),
            TokenError::Signing(msg) => {
                tracing::error!("Token signing error: {}", msg);
                ApiError::internal_server_error("Failed to issue token")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// Failures of the server-rendered pages. Form problems never get here; they travel back
/// to the form as flash messages.
#[derive(Debug)]
pub enum PageError {
    NotFound,
    Internal(String),
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => PageError::NotFound,
            other => {
                tracing::error!("Database error: {}", other);
                PageError::Internal(other.to_string())
            }
        }
    }
}

impl From<SessionError> for PageError {
    fn from(err: SessionError) -> Self {
        tracing::error!("Session error: {}", err);
        PageError::Internal(err.to_string())
    }
}

impl From<crate::render::RenderError> for PageError {
    fn from(err: crate::render::RenderError) -> Self {
        tracing::error!("Template execution error: {}", err);
        PageError::Internal(err.to_string())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => {
                (StatusCode::NOT_FOUND, Html("<h1>404 page not found</h1>")).into_response()
            }
            PageError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>500 internal server error</h1>"),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_body_names_field_and_reason() {
        let err: ApiError = ValidationError::new("title", "empty").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_json();
        assert_eq!(body["error"], "title: empty");
        assert_eq!(body["field"], "title");
        assert_eq!(body["reason"], "empty");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn store_errors_map_to_status() {
        let not_found: ApiError = StoreError::NotFound("post 'x'".into()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let db: ApiError = StoreError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert_eq!(db.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!db.message().contains("PoolTimedOut"));
    }

    #[test]
    fn token_errors_are_uniform() {
        let err: ApiError = TokenError::Invalid.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_json()["error"], "invalid token");
    }
}

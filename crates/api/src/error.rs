//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use domain::{DomainError, FieldErrors};

/// Where an empty-cart checkout is sent by default.
const EMPTY_CART_REDIRECT: &str = "/products";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// No identity was presented.
    Unauthenticated,
    /// Domain logic error.
    Domain(DomainError),
    /// Redirect the browser instead of failing.
    SeeOther(&'static str),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    /// Redirects to `location` when the cart turned out to be empty.
    pub fn empty_cart_to(self, location: &'static str) -> Self {
        match self {
            ApiError::Domain(DomainError::EmptyCart) => ApiError::SeeOther(location),
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                error_body("Sign in to continue".to_string()),
            ),
            ApiError::Domain(err) => return domain_error_to_response(err),
            ApiError::SeeOther(location) => return Redirect::to(location).into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, error_body(msg))
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn validation_body(message: String, fields: &FieldErrors) -> serde_json::Value {
    serde_json::json!({ "error": message, "fields": fields })
}

fn domain_error_to_response(err: DomainError) -> Response {
    let (status, body) = match &err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, error_body(err.to_string())),
        DomainError::Validation(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            validation_body(err.to_string(), fields),
        ),
        DomainError::Unauthorized(reason) => {
            tracing::warn!(%reason, "access denied");
            (StatusCode::FORBIDDEN, error_body(reason.clone()))
        }
        DomainError::ConcurrencyConflict { .. } => {
            (StatusCode::CONFLICT, error_body(err.to_string()))
        }
        DomainError::EmptyCart => return Redirect::to(EMPTY_CART_REDIRECT).into_response(),
        DomainError::Store(_) | DomainError::Serialization(_) => {
            tracing::error!(error = %err, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Something went wrong".to_string()),
            )
        }
    };
    (status, axum::Json(body)).into_response()
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

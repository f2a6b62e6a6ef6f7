//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CallbackError, CheckoutError, PollError};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token.
    Unauthorized(String),
    /// Authenticated but lacking the required role.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout workflow error.
    Checkout(CheckoutError),
    /// Callback reconciliation error.
    Callback(CallbackError),
    /// Status polling error.
    Poll(PollError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Callback(err) => callback_error_to_response(err),
            ApiError::Poll(err) => poll_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_)
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::GatewayRejected { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::ProductNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::AuthFailed(_) | CheckoutError::GatewayUnreachable(_) => {
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        CheckoutError::Domain(DomainError::InvalidTransition { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::Domain(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Store(_) => {
            tracing::error!(error = %err, "store failure during checkout");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn callback_error_to_response(err: CallbackError) -> (StatusCode, String) {
    match &err {
        CallbackError::Malformed(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CallbackError::UnknownPayment(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CallbackError::Domain(_) => (StatusCode::CONFLICT, err.to_string()),
        CallbackError::Store(_) => {
            tracing::error!(error = %err, "store failure during reconciliation");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn poll_error_to_response(err: PollError) -> (StatusCode, String) {
    match &err {
        // Advisory: the payment is simply not terminal yet.
        PollError::Timeout { .. } => (StatusCode::ACCEPTED, err.to_string()),
        PollError::UnknownPayment(_) => (StatusCode::NOT_FOUND, err.to_string()),
        PollError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<CallbackError> for ApiError {
    fn from(err: CallbackError) -> Self {
        ApiError::Callback(err)
    }
}

impl From<PollError> for ApiError {
    fn from(err: PollError) -> Self {
        ApiError::Poll(err)
    }
}

impl From<store::StoreError> for ApiError {
    fn from(err: store::StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use gateways::GatewayError;
use orchestrator::OrchestratorError;
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Response bodies carry enough detail to act on (which item is out of
/// stock, which address field is missing) and never raw signatures or
/// provider credentials.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Orchestration error.
    Orchestrator(OrchestratorError),
    /// Callback verification error.
    Gateway(GatewayError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Orchestrator(err) => orchestrator_error_to_response(err),
            ApiError::Gateway(err) => gateway_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn orchestrator_error_to_response(err: OrchestratorError) -> (StatusCode, String) {
    match &err {
        OrchestratorError::Validation(_) | OrchestratorError::UnknownProduct { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        OrchestratorError::OutOfStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        OrchestratorError::Order(order_err) => match order_err {
            OrderError::InvalidStateTransition { .. }
            | OrderError::InvalidPaymentTransition { .. }
            | OrderError::PaymentModeMismatch { .. }
            | OrderError::AlreadyShipped { .. } => (StatusCode::CONFLICT, err.to_string()),
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::InvalidDiscount { .. }
            | OrderError::InvalidAddress { .. }
            | OrderError::GuestEmailRequired => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        OrchestratorError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        OrchestratorError::UnknownCarrier(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        OrchestratorError::Unserviceable { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        OrchestratorError::CarrierRejected { .. } | OrchestratorError::ExternalUnavailable(_) => {
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        OrchestratorError::Store(StoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn gateway_error_to_response(err: GatewayError) -> (StatusCode, String) {
    match &err {
        GatewayError::InvalidSignature { gateway } => {
            // Potential spoofing attempt: log loudly, reveal nothing.
            tracing::error!(gateway = %gateway, "callback signature verification failed");
            (
                StatusCode::UNAUTHORIZED,
                "signature verification failed".to_string(),
            )
        }
        GatewayError::Malformed { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        GatewayError::Unavailable { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        ApiError::Orchestrator(err)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}

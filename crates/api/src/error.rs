//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
///
/// Every body is `{ "error": { "code": .., "message": .. } }` with a
/// stable machine-readable code; internal errors never leak details.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Saga workflow error.
    Saga(SagaError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Saga(err) => saga_error_to_response(err),
        };

        let body = serde_json::json!({ "error": { "code": code, "message": message } });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, &'static str, String) {
    let code = err.error_code();
    let status = match code {
        "ORDER_NOT_FOUND" | "TRANSACTION_NOT_FOUND" | "NOT_FOUND" => StatusCode::NOT_FOUND,
        "PARTY_NOT_FOUND" | "PRODUCT_NOT_FOUND" | "INSUFFICIENT_STOCK" | "INVALID_ORDER" => {
            StatusCode::BAD_REQUEST
        }
        "INVALID_STATE" | "CONFLICT" => StatusCode::CONFLICT,
        "PAYMENT_FAILED" => StatusCode::PAYMENT_REQUIRED,
        "DOWNSTREAM_UNAVAILABLE" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "internal server error");
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    (status, code, message)
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderId;

    #[test]
    fn test_status_mapping() {
        let (status, code, _) = saga_error_to_response(SagaError::OrderNotFound(OrderId::new()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "ORDER_NOT_FOUND");

        let (status, _, _) = saga_error_to_response(SagaError::InvalidState {
            expected: "CONFIRMED",
            actual: "PENDING".to_string(),
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, _) = saga_error_to_response(SagaError::PaymentFailed {
            reason: "declined".to_string(),
        });
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = SagaError::Store(store::StoreError::AlreadyExists {
            kind: "Order",
            id: "secret".to_string(),
        });
        let (status, _, message) = saga_error_to_response(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }
}

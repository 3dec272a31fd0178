//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use document_store::DocumentStoreError;
use domain::DomainError;
use paging::PagingError;

/// API-level error type that maps to HTTP responses.
///
/// Every error renders as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => domain_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Domain(err) => err.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Paging(paging_err) => match paging_err {
            PagingError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            PagingError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PagingError::StoreQueryFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainError::Store(store_err) => match store_err {
            DocumentStoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            DocumentStoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
            DocumentStoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainError::Serialization(_) | DomainError::Publish(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use common::RecordId;

    use super::*;

    #[test]
    fn test_client_errors() {
        assert_eq!(
            ApiError::from(DomainError::Paging(PagingError::InvalidCursor("x".into()))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DomainError::Validation("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DomainError::NotFound {
                kind: "Order",
                id: RecordId::from("o-1"),
            })
            .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_server_errors() {
        assert_eq!(
            ApiError::from(DomainError::Paging(PagingError::Cancelled {
                operation: "ListOrders"
            }))
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DomainError::Publish("closed".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! Paging error types.

use common::RecordId;
use document_store::DocumentStoreError;
use thiserror::Error;

/// Errors that can occur while serving a page.
#[derive(Debug, Error)]
pub enum PagingError {
    /// The page token could not be decoded. Raised before any store call.
    #[error("Invalid page token: {0:?}")]
    InvalidCursor(String),

    /// The store failed while the query was built or iterated, including a
    /// single record that could not be deserialized.
    #[error("{operation}: store query failed{}: {source}", describe_record(.record_id))]
    StoreQueryFailed {
        operation: &'static str,
        record_id: Option<RecordId>,
        #[source]
        source: DocumentStoreError,
    },

    /// The caller cancelled the request while the page was being read.
    #[error("{operation}: query cancelled")]
    Cancelled { operation: &'static str },
}

fn describe_record(record_id: &Option<RecordId>) -> String {
    match record_id {
        Some(id) => format!(" at record {id}"),
        None => String::new(),
    }
}

impl PagingError {
    pub(crate) fn store(
        operation: &'static str,
        record_id: Option<RecordId>,
        source: DocumentStoreError,
    ) -> Self {
        PagingError::StoreQueryFailed {
            operation,
            record_id,
            source,
        }
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PagingError::InvalidCursor(_))
    }
}

/// Result type for paging operations.
pub type Result<T> = std::result::Result<T, PagingError>;

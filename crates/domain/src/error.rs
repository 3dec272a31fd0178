//! Domain error types.

use common::RecordId;
use document_store::DocumentStoreError;
use paging::PagingError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// A listing failed.
    #[error(transparent)]
    Paging(#[from] PagingError),

    /// Record not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: RecordId },

    /// The request breaks a business rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A message could not be handed to the broker.
    #[error("Publish failed: {0}")]
    Publish(String),
}

impl DomainError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

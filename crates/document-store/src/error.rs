use thiserror::Error;

use crate::RecordId;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// No document with this id exists in the collection.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: RecordId },

    /// A document with this id already exists in the collection.
    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: RecordId },

    /// The store rejected the shape of a query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The document body is not acceptable for storage.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The store could not be reached or is temporarily unable to serve.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Document, DocumentStoreError, Query, RecordId, Result};

/// A lazily consumed stream of query results.
///
/// Dropping the stream releases whatever cursor or connection backs it.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<Document>> + Send>>;

/// Core trait for document store implementations.
///
/// Documents are JSON objects addressed by `(collection, id)`. All
/// implementations must be thread-safe (Send + Sync) and are injected into
/// the services that use them.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a new document.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, collection: &str, id: &RecordId, data: Value) -> Result<()>;

    /// Retrieves a document by id.
    async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Document>>;

    /// Replaces the body of an existing document.
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update(&self, collection: &str, id: &RecordId, data: Value) -> Result<()>;

    /// Deletes an existing document.
    async fn delete(&self, collection: &str, id: &RecordId) -> Result<()>;

    /// Runs a filtered, ordered, limited query.
    ///
    /// The query is validated first; an unexecutable clause sequence fails
    /// with `InvalidQuery` before any documents are read.
    async fn query(&self, query: Query) -> Result<DocumentStream>;
}

/// Extension trait providing typed convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Serializes and stores a new record.
    async fn create_record<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &RecordId,
        record: &T,
    ) -> Result<()> {
        let data = serde_json::to_value(record)?;
        self.create(collection, id, data).await
    }

    /// Loads and deserializes a record.
    async fn get_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<T>> {
        match self.get(collection, id).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    /// Serializes and replaces an existing record.
    async fn update_record<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &RecordId,
        record: &T,
    ) -> Result<()> {
        let data = serde_json::to_value(record)?;
        self.update(collection, id, data).await
    }

    /// Checks if a document exists.
    async fn exists(&self, collection: &str, id: &RecordId) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Validates a document body before it is written.
pub fn validate_document(collection: &str, data: &Value) -> Result<()> {
    if collection.is_empty() {
        return Err(DocumentStoreError::InvalidDocument(
            "Collection name must not be empty".to_string(),
        ));
    }
    if !data.is_object() {
        return Err(DocumentStoreError::InvalidDocument(format!(
            "Documents must be JSON objects, got {}",
            json_type_name(data)
        )));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_are_valid_documents() {
        assert!(validate_document("carts", &serde_json::json!({"id": "a"})).is_ok());
    }

    #[test]
    fn non_objects_are_rejected() {
        let err = validate_document("carts", &serde_json::json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn empty_collection_is_rejected() {
        assert!(validate_document("", &serde_json::json!({})).is_err());
    }
}

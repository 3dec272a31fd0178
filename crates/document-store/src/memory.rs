use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    Document, DocumentStoreError, FieldValue, Query, RecordId, Result,
    query::{OrderKey, Predicate},
    store::{DocumentStore, DocumentStream, validate_document},
};

type Collection = BTreeMap<RecordId, Value>;

/// In-memory document store implementation for testing and local runs.
///
/// This implementation keeps every collection in memory and provides
/// the same interface and query rules as the PostgreSQL implementation.
/// Each query works on a snapshot taken when it starts.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

fn satisfies(document: &Document, predicate: &Predicate) -> bool {
    document
        .field_value(&predicate.field, predicate.value.kind())
        .and_then(|value| value.compare(&predicate.value))
        .is_some_and(|ordering| predicate.op.accepts(ordering))
}

fn sort_key(document: &Document, keys: &[&OrderKey]) -> Option<Vec<FieldValue>> {
    keys.iter()
        .map(|key| document.field_value(&key.field, key.kind))
        .collect()
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: &str, id: &RecordId, data: Value) -> Result<()> {
        validate_document(collection, &data)?;

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        if documents.contains_key(id) {
            return Err(DocumentStoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.clone(),
            });
        }
        documents.insert(id.clone(), data);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|data| Document::new(id.clone(), data.clone())))
    }

    async fn update(&self, collection: &str, id: &RecordId, data: Value) -> Result<()> {
        validate_document(collection, &data)?;

        let mut collections = self.collections.write().await;
        match collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
        {
            Some(existing) => {
                *existing = data;
                Ok(())
            }
            None => Err(DocumentStoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<()> {
        let mut collections = self.collections.write().await;
        match collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
        {
            Some(_) => Ok(()),
            None => Err(DocumentStoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            }),
        }
    }

    async fn query(&self, query: Query) -> Result<DocumentStream> {
        use futures_util::stream;

        query.validate()?;

        let predicates: Vec<&Predicate> = query.predicates().collect();
        let keys: Vec<&OrderKey> = query.order_keys().collect();

        let collections = self.collections.read().await;
        let mut matched: Vec<(Vec<FieldValue>, Document)> = collections
            .get(query.collection())
            .into_iter()
            .flat_map(|documents| documents.iter())
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .filter(|document| predicates.iter().all(|p| satisfies(document, p)))
            // Documents lacking an order key are not part of an ordered result.
            .filter_map(|document| sort_key(&document, &keys).map(|key| (key, document)))
            .collect();
        drop(collections);

        // BTreeMap iteration already yields documents in id order, so a stable
        // sort leaves unordered queries in key order.
        matched.sort_by(|(a, _), (b, _)| a.cmp(b));

        if let Some(position) = query.resume_position() {
            matched.retain(|(key, _)| key.as_slice() > position);
        }

        let limit = query.limit_value().unwrap_or(usize::MAX);
        let documents: Vec<Document> = matched
            .into_iter()
            .take(limit)
            .map(|(_, document)| document)
            .collect();

        tracing::debug!(
            collection = query.collection(),
            returned = documents.len(),
            "in-memory query executed"
        );

        Ok(Box::pin(stream::iter(documents.into_iter().map(Ok))))
    }
}

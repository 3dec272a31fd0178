//! Typed record access shared by the services.

use common::RecordId;
use document_store::{DocumentStore, DocumentStoreExt};
use paging::Queryable;
use serde::Serialize;

use crate::error::{DomainError, Result};

/// Loads a record, mapping absence to `NotFound`.
pub(crate) async fn load<S, R>(store: &S, kind: &'static str, id: &RecordId) -> Result<R>
where
    S: DocumentStore,
    R: Queryable,
{
    store
        .get_record::<R>(R::COLLECTION, id)
        .await?
        .ok_or_else(|| DomainError::NotFound {
            kind,
            id: id.clone(),
        })
}

/// Replaces a stored record, mapping a vanished document to `NotFound`.
pub(crate) async fn save<S, R>(store: &S, kind: &'static str, record: &R) -> Result<()>
where
    S: DocumentStore,
    R: Queryable + Serialize + Sync,
{
    match store
        .update_record(R::COLLECTION, record.record_id(), record)
        .await
    {
        Err(document_store::DocumentStoreError::NotFound { id, .. }) => {
            Err(DomainError::NotFound { kind, id })
        }
        other => other.map_err(DomainError::from),
    }
}

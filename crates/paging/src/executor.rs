//! Page execution against the document store.

use document_store::{Document, DocumentStore, DocumentStoreError, Query};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::{PagingError, Queryable, Result};

/// Runs page queries and materializes exactly one page.
///
/// The executor holds no per-call state; one instance can serve any number
/// of concurrent requests.
#[derive(Clone)]
pub struct PageExecutor<S> {
    store: S,
}

impl<S: DocumentStore> PageExecutor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads up to `effective_size` records for `query`.
    ///
    /// When the store returns a full page, a token for the last record is
    /// returned on the assumption that more may follow; a short page ends the
    /// listing. A listing whose length is an exact multiple of the page size
    /// therefore ends with one extra call that yields no records and no token.
    ///
    /// Any store or decoding error fails the whole page, and cancellation
    /// fails it with [`PagingError::Cancelled`]. The result stream is dropped
    /// on every return path, which releases the store cursor.
    #[tracing::instrument(
        skip(self, query, cancel),
        fields(collection = %query.collection())
    )]
    pub async fn execute<R: Queryable>(
        &self,
        operation: &'static str,
        query: Query,
        effective_size: usize,
        cancel: &CancellationToken,
    ) -> Result<(Vec<R>, Option<String>)> {
        if cancel.is_cancelled() {
            return Err(PagingError::Cancelled { operation });
        }

        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PagingError::Cancelled { operation }),
            opened = self.store.query(query) => opened,
        };
        let mut stream = opened.map_err(|source| store_failure(operation, None, source))?;

        let mut records: Vec<R> = Vec::with_capacity(effective_size);
        while records.len() < effective_size {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::debug!(read = records.len(), "page read cancelled");
                    return Err(PagingError::Cancelled { operation });
                }
                next = stream.next() => next,
            };

            let Some(item) = next else {
                break;
            };
            let Document { id, data } =
                item.map_err(|source| store_failure(operation, None, source))?;
            let record: R = serde_json::from_value(data).map_err(|e| {
                store_failure(
                    operation,
                    Some(id),
                    DocumentStoreError::Serialization(e),
                )
            })?;
            records.push(record);
        }
        drop(stream);

        let next_page_token = if effective_size > 0 && records.len() == effective_size {
            records.last().map(|r| r.cursor_position().encode())
        } else {
            None
        };

        metrics::counter!("paging_pages_total", "operation" => operation).increment(1);
        metrics::histogram!("paging_page_records", "operation" => operation)
            .record(records.len() as f64);
        tracing::debug!(
            returned = records.len(),
            has_more = next_page_token.is_some(),
            "page executed"
        );

        Ok((records, next_page_token))
    }
}

fn store_failure(
    operation: &'static str,
    record_id: Option<common::RecordId>,
    source: DocumentStoreError,
) -> PagingError {
    tracing::error!(
        operation,
        record_id = record_id.as_ref().map(|id| id.as_str()),
        error = %source,
        "page query failed"
    );
    metrics::counter!("paging_store_errors_total", "operation" => operation).increment(1);
    PagingError::store(operation, record_id, source)
}

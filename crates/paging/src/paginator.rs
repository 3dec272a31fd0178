//! Listing facade combining the page-size guard, cursor codec, query
//! pipeline and executor.

use document_store::DocumentStore;
use tokio_util::sync::CancellationToken;

use crate::{
    CursorPosition, Page, PageExecutor, PageSizeLimits, QueryRequest, QuerySpec, Queryable,
    Result, build_query,
};

/// Serves paginated listings over an injected document store.
#[derive(Clone)]
pub struct Paginator<S> {
    executor: PageExecutor<S>,
    limits: PageSizeLimits,
}

impl<S: DocumentStore> Paginator<S> {
    /// Creates a paginator with the given page-size limits.
    pub fn new(store: S, limits: PageSizeLimits) -> Self {
        Self {
            executor: PageExecutor::new(store),
            limits,
        }
    }

    pub fn limits(&self) -> &PageSizeLimits {
        &self.limits
    }

    pub fn store(&self) -> &S {
        self.executor.store()
    }

    /// Fetches one page of `R` records.
    ///
    /// A malformed page token fails with `InvalidCursor` before the store is
    /// touched. Without a token the listing starts from the beginning.
    #[tracing::instrument(skip(self, request, cancel), fields(collection = R::COLLECTION))]
    pub async fn fetch_page<R: Queryable>(
        &self,
        operation: &'static str,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<R>> {
        let page_size = self.limits.clamp(request.page_size);

        let cursor = request
            .page_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(CursorPosition::decode)
            .transpose()?;

        let spec = QuerySpec::for_record::<R>(&request.filters, cursor.as_ref(), page_size.effective);
        let query = build_query(&spec);

        let (records, next_page_token) = self
            .executor
            .execute::<R>(operation, query, page_size.effective, cancel)
            .await?;

        Ok(Page {
            records,
            next_page_token,
        })
    }
}

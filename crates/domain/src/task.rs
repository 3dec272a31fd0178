//! Fulfillment tasks, one per order item.

use common::{RecordId, Timestamp};
use document_store::{DocumentStore, DocumentStoreExt};
use paging::{CancellationToken, Filters, Page, PageSizeLimits, Paginator, QueryRequest, Queryable};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::records;
use crate::value_objects::ProductCode;

/// Progress of a fulfillment task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Completed)
                | (TaskStatus::Pending | TaskStatus::InProgress, TaskStatus::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Work to deliver one order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentTask {
    pub id: RecordId,
    pub order_id: RecordId,
    pub order_item_id: RecordId,
    pub product_code: ProductCode,
    pub quantity: u32,
    pub status: TaskStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FulfillmentTask {
    /// Id of the task for an order item: `<order_id>:<order_item_id>`.
    pub fn task_id(order_id: &RecordId, order_item_id: &RecordId) -> RecordId {
        RecordId::from(format!("{order_id}:{order_item_id}"))
    }
}

impl Queryable for FulfillmentTask {
    const COLLECTION: &'static str = "tasks";
    const SORT_FIELD: &'static str = "created_at";

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn sort_timestamp(&self) -> Timestamp {
        self.created_at
    }
}

/// Command to create a pending task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub order_id: RecordId,
    pub order_item_id: RecordId,
    pub product_code: ProductCode,
    pub quantity: u32,
}

/// Filters and paging parameters for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListRequest {
    pub order_id: Option<String>,
    pub order_item_id: Option<String>,
    pub product_code: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub page_size: i32,
    pub page_token: Option<String>,
}

impl TaskListRequest {
    pub fn to_query_request(&self) -> QueryRequest {
        let filters = Filters::new()
            .equal_opt("order_id", self.order_id.clone())
            .equal_opt("order_item_id", self.order_item_id.clone())
            .equal_opt("product_code", self.product_code.clone())
            .start_time(self.start_time)
            .end_time(self.end_time);
        QueryRequest::new(filters)
            .page_size(self.page_size)
            .page_token(self.page_token.clone())
    }
}

/// Service for fulfillment tasks.
#[derive(Clone)]
pub struct TaskService<S> {
    store: S,
    paginator: Paginator<S>,
}

impl<S: DocumentStore + Clone> TaskService<S> {
    pub fn new(store: S, limits: PageSizeLimits) -> Self {
        Self {
            paginator: Paginator::new(store.clone(), limits),
            store,
        }
    }

    /// Creates a pending task.
    ///
    /// The id is derived from the order item, so a second call for the same
    /// item fails with the store's `AlreadyExists`.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, cmd: NewTask) -> Result<FulfillmentTask> {
        if cmd.product_code.is_empty() {
            return Err(DomainError::validation("product code is required"));
        }
        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity must be greater than 0"));
        }

        let now = Timestamp::now();
        let task = FulfillmentTask {
            id: FulfillmentTask::task_id(&cmd.order_id, &cmd.order_item_id),
            order_id: cmd.order_id,
            order_item_id: cmd.order_item_id,
            product_code: cmd.product_code,
            quantity: cmd.quantity,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store
            .create_record(FulfillmentTask::COLLECTION, &task.id, &task)
            .await?;
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, task_id: &RecordId) -> Result<FulfillmentTask> {
        records::load(&self.store, "Task", task_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        task_id: &RecordId,
        status: TaskStatus,
    ) -> Result<FulfillmentTask> {
        let mut task = self.get_task(task_id).await?;
        if task.status == status {
            return Ok(task);
        }
        if !task.status.can_transition_to(status) {
            return Err(DomainError::Validation(format!(
                "cannot move task from {} to {}",
                task.status, status
            )));
        }

        task.status = status;
        task.updated_at = Timestamp::now();
        records::save(&self.store, "Task", &task).await?;
        Ok(task)
    }

    /// Lists tasks by `(created_at, id)`, one page per call.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn list_tasks(
        &self,
        request: &TaskListRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<FulfillmentTask>> {
        let page = self
            .paginator
            .fetch_page::<FulfillmentTask>("ListTasks", &request.to_query_request(), cancel)
            .await?;
        Ok(page)
    }
}

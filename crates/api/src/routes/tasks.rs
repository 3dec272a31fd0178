//! Fulfillment task endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::RecordId;
use document_store::DocumentStore;
use domain::{FulfillmentTask, TaskListRequest, TaskStatus};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::listing::{ListResponse, non_empty, parse_time};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    pub order_id: Option<String>,
    pub order_item_id: Option<String>,
    pub product_code: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page_size: Option<i32>,
    pub page_token: Option<String>,
}

impl ListTasksParams {
    fn into_request(self) -> Result<TaskListRequest, ApiError> {
        Ok(TaskListRequest {
            start_time: parse_time("start_time", self.start_time.as_deref())?,
            end_time: parse_time("end_time", self.end_time.as_deref())?,
            order_id: non_empty(self.order_id),
            order_item_id: non_empty(self.order_item_id),
            product_code: non_empty(self.product_code),
            page_size: self.page_size.unwrap_or(0),
            page_token: self.page_token,
        })
    }
}

#[derive(Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub order_id: String,
    pub order_item_id: String,
    pub product_code: String,
    pub quantity: u32,
    pub status: TaskStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FulfillmentTask> for TaskResponse {
    fn from(task: FulfillmentTask) -> Self {
        Self {
            id: task.id.into_string(),
            order_id: task.order_id.into_string(),
            order_item_id: task.order_item_id.into_string(),
            product_code: task.product_code.to_string(),
            quantity: task.quantity,
            status: task.status,
            created_at: task.created_at.to_string(),
            updated_at: task.updated_at.to_string(),
        }
    }
}

/// GET /tasks: one page of tasks, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<ListResponse<TaskResponse>>, ApiError> {
    let request = params.into_request()?;
    let cancel = state.shutdown.child_token();
    let page = state.tasks.list_tasks(&request, &cancel).await?;
    Ok(Json(ListResponse::from_page(page, TaskResponse::from)))
}

/// GET /tasks/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.tasks.get_task(&RecordId::from(id)).await?;
    Ok(Json(task.into()))
}

/// POST /tasks/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskStatusRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .tasks
        .update_status(&RecordId::from(id), req.status)
        .await?;
    Ok(Json(task.into()))
}

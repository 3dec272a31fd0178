//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::RecordId;
use document_store::DocumentStore;
use domain::{Order, OrderItem, OrderListRequest, OrderStatus};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::listing::{ListResponse, non_empty, parse_time};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub orderer_family_name: Option<String>,
    pub orderer_given_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page_size: Option<i32>,
    pub page_token: Option<String>,
}

impl ListOrdersParams {
    fn into_request(self) -> Result<OrderListRequest, ApiError> {
        Ok(OrderListRequest {
            start_time: parse_time("start_time", self.start_time.as_deref())?,
            end_time: parse_time("end_time", self.end_time.as_deref())?,
            orderer_family_name: non_empty(self.orderer_family_name),
            orderer_given_name: non_empty(self.orderer_given_name),
            page_size: self.page_size.unwrap_or(0),
            page_token: self.page_token,
        })
    }
}

#[derive(Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub cart_id: String,
    pub orderer_family_name: String,
    pub orderer_given_name: String,
    pub items: Vec<OrderItemResponse>,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_code: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_code: item.product_code.to_string(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents.cents(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            total_cents: order.total_amount().cents(),
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            id: order.id.into_string(),
            cart_id: order.cart_id.into_string(),
            orderer_family_name: order.orderer_family_name,
            orderer_given_name: order.orderer_given_name,
            status: order.status,
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

// -- Handlers --

/// GET /orders: one page of orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<ListResponse<OrderResponse>>, ApiError> {
    let request = params.into_request()?;
    let cancel = state.shutdown.child_token();
    let page = state.orders.list_orders(&request, &cancel).await?;
    Ok(Json(ListResponse::from_page(page, OrderResponse::from)))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(&RecordId::from(id)).await?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .update_status(&RecordId::from(id), req.status)
        .await?;
    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_become_list_request() {
        let params = ListOrdersParams {
            orderer_family_name: Some("Tanaka".to_string()),
            orderer_given_name: Some(String::new()),
            start_time: Some("2024-01-01T00:00:00Z".to_string()),
            end_time: None,
            page_size: None,
            page_token: Some("1,a".to_string()),
        };

        let request = params.into_request().unwrap();
        assert_eq!(request.orderer_family_name.as_deref(), Some("Tanaka"));
        assert_eq!(request.orderer_given_name, None);
        assert_eq!(
            request.start_time.map(|t| t.as_nanos()),
            Some(1_704_067_200_000_000_000)
        );
        assert_eq!(request.end_time, None);
        assert_eq!(request.page_size, 0);
        assert_eq!(request.page_token.as_deref(), Some("1,a"));
    }

    #[test]
    fn test_params_reject_bad_time() {
        let params = ListOrdersParams {
            end_time: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            params.into_request(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_status_request_uses_snake_case() {
        let req: UpdateOrderStatusRequest =
            serde_json::from_value(serde_json::json!({"status": "fulfilling"})).unwrap();
        assert_eq!(req.status, OrderStatus::Fulfilling);
    }
}

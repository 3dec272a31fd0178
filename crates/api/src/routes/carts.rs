//! Cart endpoints, including checkout.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::RecordId;
use document_store::DocumentStore;
use domain::{Cart, CartItem, Money, PlaceOrder, ProductCode};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::orders::OrderResponse;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCartRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_code: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub orderer_family_name: String,
    pub orderer_given_name: String,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub product_code: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            total_cents: cart.total().cents(),
            items: cart
                .items
                .iter()
                .map(|item| CartItemResponse {
                    product_code: item.product_code.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents.cents(),
                })
                .collect(),
            id: cart.id.into_string(),
            user_id: cart.user_id,
            created_at: cart.created_at.to_string(),
            updated_at: cart.updated_at.to_string(),
        }
    }
}

// -- Handlers --

/// POST /carts: create an empty cart.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCartRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let cart = state.carts.create_cart(&req.user_id).await?;
    Ok((StatusCode::CREATED, Json(cart.into())))
}

/// GET /carts/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_cart(&RecordId::from(id)).await?;
    Ok(Json(cart.into()))
}

/// POST /carts/{id}/items: add an item, merging with an existing line.
#[tracing::instrument(skip(state))]
pub async fn add_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let item = CartItem::new(
        req.product_code,
        req.quantity,
        Money::from_cents(req.unit_price_cents),
    );
    let cart = state.carts.add_item(&RecordId::from(id), item).await?;
    Ok(Json(cart.into()))
}

/// DELETE /carts/{id}/items/{product_code}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, product_code)): Path<(String, String)>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .remove_item(&RecordId::from(id), &ProductCode::new(product_code))
        .await?;
    Ok(Json(cart.into()))
}

/// POST /carts/{id}/checkout: place an order from the cart.
#[tracing::instrument(skip(state))]
pub async fn checkout<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let cmd = PlaceOrder::new(
        RecordId::from(id),
        req.orderer_family_name,
        req.orderer_given_name,
    );
    let order = state.orders.place_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

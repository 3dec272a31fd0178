//! Order records.

use common::{RecordId, Timestamp};
use paging::Queryable;
use serde::{Deserialize, Serialize};

use super::OrderStatus;
use crate::cart::Cart;
use crate::value_objects::{Money, ProductCode};

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique within the order.
    pub id: RecordId,
    pub product_code: ProductCode,
    pub quantity: u32,
    pub unit_price_cents: Money,
}

impl OrderItem {
    pub fn total_price(&self) -> Money {
        self.unit_price_cents.multiply(self.quantity)
    }
}

/// An order placed from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: RecordId,
    pub cart_id: RecordId,
    pub orderer_family_name: String,
    pub orderer_given_name: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Builds a placed order from the cart's lines. Item ids are positional
    /// (`item-1`, `item-2`, ...).
    pub(crate) fn from_cart(cart: &Cart, family_name: &str, given_name: &str) -> Self {
        let now = Timestamp::now();
        let items = cart
            .items
            .iter()
            .enumerate()
            .map(|(n, item)| OrderItem {
                id: RecordId::from(format!("item-{}", n + 1)),
                product_code: item.product_code.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
            })
            .collect();

        Self {
            id: RecordId::new(),
            cart_id: cart.id.clone(),
            orderer_family_name: family_name.to_string(),
            orderer_given_name: given_name.to_string(),
            items,
            status: OrderStatus::Placed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_amount(&self) -> Money {
        self.items.iter().map(OrderItem::total_price).sum()
    }

    pub fn item(&self, item_id: &RecordId) -> Option<&OrderItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }
}

impl Queryable for Order {
    const COLLECTION: &'static str = "orders";
    const SORT_FIELD: &'static str = "created_at";

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn sort_timestamp(&self) -> Timestamp {
        self.created_at
    }
}

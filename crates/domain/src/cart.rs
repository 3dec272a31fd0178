//! Shopping carts.

use common::{RecordId, Timestamp};
use document_store::{DocumentStore, DocumentStoreExt};
use paging::Queryable;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::records;
use crate::value_objects::{Money, ProductCode};

/// A product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_code: ProductCode,
    pub quantity: u32,
    pub unit_price_cents: Money,
}

impl CartItem {
    pub fn new(product_code: impl Into<ProductCode>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
            unit_price_cents: unit_price,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.product_code.is_empty() {
            return Err(DomainError::validation("product code is required"));
        }
        if self.quantity == 0 {
            return Err(DomainError::validation(
                "quantity must be greater than 0",
            ));
        }
        if self.unit_price_cents.is_negative() {
            return Err(DomainError::validation("unit price must not be negative"));
        }
        Ok(())
    }
}

/// A user's cart, converted into an order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: RecordId,
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    fn new(user_id: String) -> Self {
        let now = Timestamp::now();
        Self {
            id: RecordId::new(),
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Money {
        self.items
            .iter()
            .map(|item| item.unit_price_cents.multiply(item.quantity))
            .sum()
    }

    /// Adds an item. A product already in the cart has its quantity
    /// increased and takes the newer unit price.
    fn add_item(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.product_code == item.product_code)
        {
            Some(existing) => {
                existing.quantity += item.quantity;
                existing.unit_price_cents = item.unit_price_cents;
            }
            None => self.items.push(item),
        }
    }

    fn remove_item(&mut self, product_code: &ProductCode) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_code != product_code);
        self.items.len() != before
    }
}

impl Queryable for Cart {
    const COLLECTION: &'static str = "carts";
    const SORT_FIELD: &'static str = "created_at";

    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn sort_timestamp(&self) -> Timestamp {
        self.created_at
    }
}

/// Service for managing carts.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: DocumentStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an empty cart for a user.
    #[tracing::instrument(skip(self))]
    pub async fn create_cart(&self, user_id: &str) -> Result<Cart> {
        if user_id.trim().is_empty() {
            return Err(DomainError::validation("user id is required"));
        }
        let cart = Cart::new(user_id.to_string());
        self.store
            .create_record(Cart::COLLECTION, &cart.id, &cart)
            .await?;
        tracing::debug!(cart_id = %cart.id, "cart created");
        Ok(cart)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: &RecordId) -> Result<Cart> {
        records::load(&self.store, "Cart", cart_id).await
    }

    /// Adds an item, merging with an existing line for the same product.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, cart_id: &RecordId, item: CartItem) -> Result<Cart> {
        item.validate()?;
        let mut cart = self.get_cart(cart_id).await?;
        cart.add_item(item);
        cart.updated_at = Timestamp::now();
        records::save(&self.store, "Cart", &cart).await?;
        Ok(cart)
    }

    /// Removes every line for `product_code`.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: &RecordId, product_code: &ProductCode) -> Result<Cart> {
        let mut cart = self.get_cart(cart_id).await?;
        if !cart.remove_item(product_code) {
            return Err(DomainError::NotFound {
                kind: "Cart item",
                id: RecordId::from(product_code.as_str()),
            });
        }
        cart.updated_at = Timestamp::now();
        records::save(&self.store, "Cart", &cart).await?;
        Ok(cart)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_cart(&self, cart_id: &RecordId) -> Result<()> {
        match self.store.delete(Cart::COLLECTION, cart_id).await {
            Err(document_store::DocumentStoreError::NotFound { id, .. }) => {
                Err(DomainError::NotFound { kind: "Cart", id })
            }
            other => other.map_err(DomainError::from),
        }
    }
}

//! Order service: checkout, status changes and listings.

use common::{RecordId, Timestamp};
use document_store::{DocumentStore, DocumentStoreExt};
use paging::{CancellationToken, Filters, Page, PageSizeLimits, Paginator, QueryRequest, Queryable};

use super::{Order, OrderStatus};
use crate::cart::Cart;
use crate::error::{DomainError, Result};
use crate::messaging::{Message, Publisher};
use crate::records;

/// Command to turn a cart into an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub cart_id: RecordId,
    pub orderer_family_name: String,
    pub orderer_given_name: String,
}

impl PlaceOrder {
    pub fn new(
        cart_id: RecordId,
        family_name: impl Into<String>,
        given_name: impl Into<String>,
    ) -> Self {
        Self {
            cart_id,
            orderer_family_name: family_name.into(),
            orderer_given_name: given_name.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.orderer_family_name.trim().is_empty() {
            return Err(DomainError::validation("orderer family name is required"));
        }
        if self.orderer_given_name.trim().is_empty() {
            return Err(DomainError::validation("orderer given name is required"));
        }
        Ok(())
    }
}

/// Filters and paging parameters for listing orders.
///
/// Missing or empty filters are not applied. The time range applies to
/// `created_at`, start inclusive and end exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListRequest {
    pub orderer_family_name: Option<String>,
    pub orderer_given_name: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub page_size: i32,
    pub page_token: Option<String>,
}

impl OrderListRequest {
    pub fn to_query_request(&self) -> QueryRequest {
        let filters = Filters::new()
            .equal_opt("orderer_family_name", self.orderer_family_name.clone())
            .equal_opt("orderer_given_name", self.orderer_given_name.clone())
            .start_time(self.start_time)
            .end_time(self.end_time);
        QueryRequest::new(filters)
            .page_size(self.page_size)
            .page_token(self.page_token.clone())
    }
}

/// Service for placing and querying orders.
#[derive(Clone)]
pub struct OrderService<S, P> {
    store: S,
    paginator: Paginator<S>,
    publisher: P,
}

impl<S, P> OrderService<S, P>
where
    S: DocumentStore + Clone,
    P: Publisher,
{
    pub fn new(store: S, publisher: P, limits: PageSizeLimits) -> Self {
        Self {
            paginator: Paginator::new(store.clone(), limits),
            store,
            publisher,
        }
    }

    /// Places an order from a cart.
    ///
    /// The order is stored, the cart deleted and `OrderPlaced` published, in
    /// that order. The cart must exist and hold at least one item.
    #[tracing::instrument(skip(self), fields(cart_id = %cmd.cart_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order> {
        cmd.validate()?;
        let cart: Cart = records::load(&self.store, "Cart", &cmd.cart_id).await?;
        if cart.is_empty() {
            return Err(DomainError::validation("cart has no items"));
        }

        let order = Order::from_cart(&cart, &cmd.orderer_family_name, &cmd.orderer_given_name);
        self.store
            .create_record(Order::COLLECTION, &order.id, &order)
            .await?;
        self.store.delete(Cart::COLLECTION, &cart.id).await?;

        self.publisher
            .publish(Message::OrderPlaced {
                order_id: order.id.clone(),
            })
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, items = order.items.len(), "order placed");
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: &RecordId) -> Result<Order> {
        records::load(&self.store, "Order", order_id).await
    }

    /// Moves an order to `status`. Setting the current status again is a
    /// no-op.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: &RecordId, status: OrderStatus) -> Result<Order> {
        let mut order = self.get_order(order_id).await?;
        if order.status == status {
            return Ok(order);
        }
        if !order.status.can_transition_to(status) {
            return Err(DomainError::Validation(format!(
                "cannot move order from {} to {}",
                order.status, status
            )));
        }

        order.status = status;
        order.updated_at = Timestamp::now();
        records::save(&self.store, "Order", &order).await?;
        Ok(order)
    }

    /// Lists orders by `(created_at, id)`, one page per call.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn list_orders(
        &self,
        request: &OrderListRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<Order>> {
        let page = self
            .paginator
            .fetch_page::<Order>("ListOrders", &request.to_query_request(), cancel)
            .await?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartItem, CartService};
    use crate::messaging::{InMemoryPublisher, Subscription};
    use crate::value_objects::Money;
    use document_store::InMemoryDocumentStore;

    struct Fixture {
        carts: CartService<InMemoryDocumentStore>,
        orders: OrderService<InMemoryDocumentStore, InMemoryPublisher>,
        subscription: Subscription,
    }

    fn fixture() -> Fixture {
        let store = InMemoryDocumentStore::new();
        let (publisher, subscription) = InMemoryPublisher::channel();
        Fixture {
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store, publisher, PageSizeLimits::default()),
            subscription,
        }
    }

    async fn filled_cart(carts: &CartService<InMemoryDocumentStore>) -> Cart {
        let cart = carts.create_cart("user-1").await.unwrap();
        carts
            .add_item(&cart.id, CartItem::new("SKU-1", 2, Money::from_cents(500)))
            .await
            .unwrap();
        carts
            .add_item(&cart.id, CartItem::new("SKU-2", 1, Money::from_cents(1200)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_place_order_consumes_cart_and_publishes() {
        let mut f = fixture();
        let cart = filled_cart(&f.carts).await;

        let order = f
            .orders
            .place_order(PlaceOrder::new(cart.id.clone(), "Yamada", "Taro"))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.cart_id, cart.id);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].id.as_str(), "item-1");
        assert_eq!(order.total_amount().cents(), 2200);
        assert_eq!(f.orders.get_order(&order.id).await.unwrap(), order);
        assert!(matches!(
            f.carts.get_cart(&cart.id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert_eq!(
            f.subscription.next().await.unwrap().unwrap(),
            Message::OrderPlaced { order_id: order.id }
        );
    }

    #[tokio::test]
    async fn test_place_order_validates_names() {
        let f = fixture();
        let cart = filled_cart(&f.carts).await;

        let err = f
            .orders
            .place_order(PlaceOrder::new(cart.id.clone(), " ", "Taro"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = f
            .orders
            .place_order(PlaceOrder::new(cart.id.clone(), "Yamada", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        // The cart survives a rejected checkout.
        assert!(f.carts.get_cart(&cart.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_cart() {
        let f = fixture();
        let cart = f.carts.create_cart("user-1").await.unwrap();

        let err = f
            .orders
            .place_order(PlaceOrder::new(cart.id, "Yamada", "Taro"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_place_order_missing_cart() {
        let f = fixture();
        let err = f
            .orders
            .place_order(PlaceOrder::new(RecordId::from("missing"), "Yamada", "Taro"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { kind: "Cart", .. }));
    }

    #[tokio::test]
    async fn test_update_status_follows_transitions() {
        let f = fixture();
        let cart = filled_cart(&f.carts).await;
        let order = f
            .orders
            .place_order(PlaceOrder::new(cart.id, "Yamada", "Taro"))
            .await
            .unwrap();

        let err = f
            .orders
            .update_status(&order.id, OrderStatus::Fulfilled)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let updated = f
            .orders
            .update_status(&order.id, OrderStatus::Fulfilling)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Fulfilling);
        assert!(updated.updated_at >= order.updated_at);

        let again = f
            .orders
            .update_status(&order.id, OrderStatus::Fulfilling)
            .await
            .unwrap();
        assert_eq!(again, updated);
    }

    #[test]
    fn test_list_request_skips_missing_filters() {
        let request = OrderListRequest {
            orderer_family_name: Some("Yamada".to_string()),
            page_size: 5,
            page_token: Some(String::new()),
            ..Default::default()
        };
        let query = request.to_query_request();
        assert_eq!(query.filters.equalities().count(), 1);
        assert_eq!(query.page_size, 5);
        assert_eq!(query.page_token, None);
    }
}

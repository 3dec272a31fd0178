//! Turns placed orders into fulfillment tasks.

use common::RecordId;
use document_store::{DocumentStore, DocumentStoreError};
use tokio_util::sync::CancellationToken;

use crate::error::{DomainError, Result};
use crate::messaging::{Message, Subscription};
use crate::order::Order;
use crate::records;
use crate::task::{NewTask, TaskService};

/// Outcome of handling one `OrderPlaced` message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FulfillmentReport {
    pub created: usize,
    /// Items whose task already existed.
    pub skipped: usize,
}

/// Consumes order messages and creates one pending task per order item.
#[derive(Clone)]
pub struct FulfillmentHandler<S> {
    store: S,
    tasks: TaskService<S>,
}

impl<S: DocumentStore + Clone> FulfillmentHandler<S> {
    pub fn new(store: S, tasks: TaskService<S>) -> Self {
        Self { store, tasks }
    }

    /// Handles one message.
    ///
    /// Redelivery is safe: task ids are derived from the order item, and an
    /// item whose task already exists is skipped.
    #[tracing::instrument(skip(self), fields(message_type = message.message_type()))]
    pub async fn handle(&self, message: Message) -> Result<FulfillmentReport> {
        match message {
            Message::OrderPlaced { order_id } => self.create_tasks(&order_id).await,
        }
    }

    async fn create_tasks(&self, order_id: &RecordId) -> Result<FulfillmentReport> {
        let order: Order = records::load(&self.store, "Order", order_id).await?;
        let mut report = FulfillmentReport::default();

        for item in &order.items {
            let cmd = NewTask {
                order_id: order.id.clone(),
                order_item_id: item.id.clone(),
                product_code: item.product_code.clone(),
                quantity: item.quantity,
            };
            match self.tasks.create_task(cmd).await {
                Ok(_) => report.created += 1,
                Err(DomainError::Store(DocumentStoreError::AlreadyExists { id, .. })) => {
                    tracing::debug!(task_id = %id, "task already exists");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        metrics::counter!("fulfillment_tasks_created_total").increment(report.created as u64);
        tracing::info!(
            order_id = %order.id,
            created = report.created,
            skipped = report.skipped,
            "fulfillment tasks recorded"
        );
        Ok(report)
    }

    /// Processes messages until `cancel` fires or every publisher is gone.
    ///
    /// A message that fails is logged and dropped; the loop keeps going.
    pub async fn run(&self, mut subscription: Subscription, cancel: CancellationToken) {
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!("fulfillment handler stopping");
                    return;
                }
                next = subscription.next() => next,
            };

            match next {
                Some(Ok(message)) => {
                    if let Err(e) = self.handle(message).await {
                        tracing::error!(error = %e, "failed to handle message");
                    }
                }
                Some(Err(e)) => tracing::warn!(error = %e, "dropping undecodable message"),
                None => {
                    tracing::info!("subscription closed");
                    return;
                }
            }
        }
    }
}

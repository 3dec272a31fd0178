//! Messages exchanged between order placement and fulfillment.
//!
//! Messages travel as JSON payloads so that a broker-backed [`Publisher`]
//! can be swapped in for [`InMemoryPublisher`] without touching either side.

use async_trait::async_trait;
use common::RecordId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{DomainError, Result};

/// A domain message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Message {
    /// An order was stored and awaits fulfillment.
    OrderPlaced { order_id: RecordId },
}

impl Message {
    pub fn message_type(&self) -> &'static str {
        match self {
            Message::OrderPlaced { .. } => "OrderPlaced",
        }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Hands messages to subscribers.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, message: Message) -> Result<()>;
}

/// Publisher backed by an unbounded in-process channel.
#[derive(Debug, Clone)]
pub struct InMemoryPublisher {
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

impl InMemoryPublisher {
    /// Creates a publisher and the subscription receiving its messages.
    pub fn channel() -> (Self, Subscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, Subscription { receiver })
    }

    /// Sends a raw payload, bypassing serialization.
    pub fn publish_raw(&self, payload: Vec<u8>) -> Result<()> {
        self.sender
            .send(payload)
            .map_err(|_| DomainError::Publish("subscription closed".to_string()))
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    #[tracing::instrument(skip(self), fields(message_type = message.message_type()))]
    async fn publish(&self, message: Message) -> Result<()> {
        self.publish_raw(message.to_payload()?)
    }
}

/// Receiving end of an [`InMemoryPublisher`].
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Subscription {
    /// Waits for the next message.
    ///
    /// Returns `None` once every publisher has been dropped. A payload that
    /// does not decode is returned as an error and does not end the stream.
    pub async fn next(&mut self) -> Option<Result<Message>> {
        let payload = self.receiver.recv().await?;
        Some(Message::from_payload(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_tagged_json() {
        let message = Message::OrderPlaced {
            order_id: RecordId::from("o-1"),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&message.to_payload().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "OrderPlaced", "data": {"order_id": "o-1"}})
        );
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let (publisher, mut subscription) = InMemoryPublisher::channel();
        let message = Message::OrderPlaced {
            order_id: RecordId::from("o-1"),
        };

        publisher.publish(message.clone()).await.unwrap();

        assert_eq!(subscription.next().await.unwrap().unwrap(), message);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let (publisher, mut subscription) = InMemoryPublisher::channel();
        publisher.publish_raw(b"not json".to_vec()).unwrap();

        assert!(matches!(
            subscription.next().await,
            Some(Err(DomainError::Serialization(_)))
        ));
    }

    #[tokio::test]
    async fn test_subscription_ends_when_publishers_drop() {
        let (publisher, mut subscription) = InMemoryPublisher::channel();
        drop(publisher);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_after_subscription_dropped_fails() {
        let (publisher, subscription) = InMemoryPublisher::channel();
        drop(subscription);

        let err = publisher
            .publish(Message::OrderPlaced {
                order_id: RecordId::from("o-1"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Publish(_)));
    }
}

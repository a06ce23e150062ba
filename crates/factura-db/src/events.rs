//! # Change Notifications
//!
//! A broadcast feed of committed mutations.
//!
//! ## How List Screens Stay Fresh
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Change Feed                                       │
//! │                                                                         │
//! │  Repository commit ──► publish(ChangeEvent) ──► broadcast::Sender      │
//! │                                                      │                  │
//! │                          ┌───────────────────────────┼──────────┐      │
//! │                          ▼                           ▼          ▼      │
//! │                    invoice list                customer list   ...     │
//! │                    (re-queries on              (re-queries on          │
//! │                     Invoice events)             Customer events)       │
//! │                                                                         │
//! │  Subscribing:   let mut feed = db.subscribe();                         │
//! │  Unsubscribing: drop(feed);   // deterministic release                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events are published strictly after the transaction commits, so a
//! subscriber that re-queries on receipt always sees the new state.
//! Lagging subscribers lose oldest events (broadcast semantics); a list
//! screen that re-queries on every event is unaffected by the gap.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per subscriber before the oldest are dropped.
pub const CHANGE_FEED_CAPACITY: usize = 64;

/// Which table a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Factory,
    Product,
    Invoice,
}

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Created,
    Updated,
    Deleted,
}

/// A committed mutation, published once per logical save.
///
/// An invoice save that also rewrites its item list publishes a single
/// `Invoice` event; items never change outside their parent's save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub entity: EntityKind,
    pub id: String,
    pub op: ChangeOp,
}

/// Shared publisher handed to every repository.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Creates a feed with the default capacity.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        ChangeFeed { sender }
    }

    /// Opens a new subscription to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publishes a committed change. A send with no live subscribers is
    /// not an error; the event is simply dropped.
    pub fn publish(&self, entity: EntityKind, id: &str, op: ChangeOp) {
        let event = ChangeEvent {
            entity,
            id: id.to_string(),
            op,
        };
        trace!(?event, "publishing change event");
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        feed.publish(EntityKind::Invoice, "inv-1", ChangeOp::Created);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            ChangeEvent {
                entity: EntityKind::Invoice,
                id: "inv-1".to_string(),
                op: ChangeOp::Created,
            }
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let feed = ChangeFeed::new();
        feed.publish(EntityKind::Customer, "c-1", ChangeOp::Deleted);
    }

    #[tokio::test]
    async fn test_dropped_receiver_unsubscribes() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();
        drop(rx);

        // No live receivers again; publishing still succeeds.
        feed.publish(EntityKind::Product, "p-1", ChangeOp::Updated);
    }
}

//! Internal event system for order lifecycle notifications
//!
//! The EventBus decouples the order manager from write-behind consumers such
//! as the statistics mirror. It uses `tokio::sync::broadcast`: publishing
//! never blocks and never fails, and a slow or missing consumer cannot affect
//! the order engine.
//!
//! # Architecture
//!
//! ```text
//! OrderManager ──▶ EventBus::publish() ──▶ broadcast channel ──▶ stats mirror
//!                                                            ──▶ other subscribers
//! ```

use crate::entities::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted by the order manager
///
/// Each event carries the full order snapshot as JSON so that consumers do
/// not need to read the order store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderEvent {
    /// An order was persisted
    Created {
        order_id: Uuid,
        order_number: String,
        data: serde_json::Value,
    },
    /// An order moved to a new status
    StatusChanged {
        order_id: Uuid,
        order_number: String,
        from: OrderStatus,
        to: OrderStatus,
        data: serde_json::Value,
    },
    /// An order was cancelled
    Cancelled {
        order_id: Uuid,
        order_number: String,
        reason: String,
        data: serde_json::Value,
    },
    /// Loaned material came back
    MaterialReturned {
        order_id: Uuid,
        order_number: String,
        data: serde_json::Value,
    },
}

impl OrderEvent {
    pub fn created(order: &Order) -> Self {
        OrderEvent::Created {
            order_id: crate::core::Entity::id(order),
            order_number: order.order_number().to_string(),
            data: snapshot(order),
        }
    }

    pub fn status_changed(order: &Order, from: OrderStatus) -> Self {
        OrderEvent::StatusChanged {
            order_id: crate::core::Entity::id(order),
            order_number: order.order_number().to_string(),
            from,
            to: order.status(),
            data: snapshot(order),
        }
    }

    pub fn cancelled(order: &Order) -> Self {
        OrderEvent::Cancelled {
            order_id: crate::core::Entity::id(order),
            order_number: order.order_number().to_string(),
            reason: order.cancellation_reason().unwrap_or_default().to_string(),
            data: snapshot(order),
        }
    }

    pub fn material_returned(order: &Order) -> Self {
        OrderEvent::MaterialReturned {
            order_id: crate::core::Entity::id(order),
            order_number: order.order_number().to_string(),
            data: snapshot(order),
        }
    }

    /// Get the order ID this event relates to
    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::Created { order_id, .. }
            | OrderEvent::StatusChanged { order_id, .. }
            | OrderEvent::Cancelled { order_id, .. }
            | OrderEvent::MaterialReturned { order_id, .. } => *order_id,
        }
    }

    pub fn order_number(&self) -> &str {
        match self {
            OrderEvent::Created { order_number, .. }
            | OrderEvent::StatusChanged { order_number, .. }
            | OrderEvent::Cancelled { order_number, .. }
            | OrderEvent::MaterialReturned { order_number, .. } => order_number,
        }
    }

    /// Order snapshot carried by the event
    pub fn data(&self) -> &serde_json::Value {
        match self {
            OrderEvent::Created { data, .. }
            | OrderEvent::StatusChanged { data, .. }
            | OrderEvent::Cancelled { data, .. }
            | OrderEvent::MaterialReturned { data, .. } => data,
        }
    }

    /// Get the action name
    pub fn action(&self) -> &str {
        match self {
            OrderEvent::Created { .. } => "created",
            OrderEvent::StatusChanged { .. } => "status_changed",
            OrderEvent::Cancelled { .. } => "cancelled",
            OrderEvent::MaterialReturned { .. } => "material_returned",
        }
    }
}

fn snapshot(order: &Order) -> serde_json::Value {
    serde_json::to_value(order).unwrap_or(serde_json::Value::Null)
}

/// Envelope wrapping an order event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: OrderEvent,
}

impl EventEnvelope {
    /// Create a new event envelope
    pub fn new(event: OrderEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone (Arc internally) and can be shared across threads.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of receivers that will receive the event. With no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: OrderEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

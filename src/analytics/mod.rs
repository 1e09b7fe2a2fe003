//! Write-behind statistics mirror
//!
//! A background task listens to the [`EventBus`] and upserts one flat
//! document per order into a [`StatsSink`] (a document store in production).
//! The order engine never waits for it and never reads from it; a failing or
//! absent sink only costs analytics freshness.

use crate::core::events::{EventBus, EventEnvelope};
use crate::entities::{Order, OrderStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Flat per-order document kept by the analytics store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatsDocument {
    pub order_id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub menu_id: Uuid,
    pub menu_name: String,
    pub number_of_persons: u32,
    /// Minor currency units
    pub total_price: i64,
    pub status: OrderStatus,
    pub has_material_loan: bool,
    pub delivery_datetime: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_action: String,
    pub synced_at: DateTime<Utc>,
}

impl OrderStatsDocument {
    /// Build the document from the order snapshot carried by an event
    ///
    /// Returns `None` when the snapshot cannot be read back as an order,
    /// including a snapshot that breaks the order invariants.
    pub fn from_event(envelope: &EventEnvelope) -> Option<Self> {
        let order: Order = serde_json::from_value(envelope.event.data().clone()).ok()?;
        Some(Self {
            order_id: envelope.event.order_id(),
            order_number: order.order_number().to_string(),
            user_id: order.user_id(),
            menu_id: order.menu_id(),
            menu_name: order.menu_name().to_string(),
            number_of_persons: order.number_of_persons(),
            total_price: order.total_price().cents(),
            status: order.status(),
            has_material_loan: order.has_material_loan(),
            delivery_datetime: order.delivery_datetime(),
            created_at: crate::core::Entity::created_at(&order),
            last_action: envelope.event.action().to_string(),
            synced_at: envelope.timestamp,
        })
    }
}

/// Analytics store port
#[async_trait]
pub trait StatsSink: Send + Sync {
    /// Insert or replace the document for its order number
    async fn record(&self, document: &OrderStatsDocument) -> Result<()>;
}

/// Sink keeping documents in memory, keyed by order number
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatsSink {
    documents: Arc<RwLock<HashMap<String, OrderStatsDocument>>>,
}

impl InMemoryStatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, order_number: &str) -> Option<OrderStatsDocument> {
        self.documents.read().await.get(order_number).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl StatsSink for InMemoryStatsSink {
    async fn record(&self, document: &OrderStatsDocument) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(document.order_number.clone(), document.clone());
        Ok(())
    }
}

/// Subscribe to the bus and mirror every order event into `sink`
///
/// The subscription is taken before the task starts, so events published
/// after this call returns are never missed. The task ends once every
/// clone of the bus is dropped.
pub fn spawn_stats_mirror(bus: &EventBus, sink: Arc<dyn StatsSink>) -> JoinHandle<()> {
    let rx = bus.subscribe();
    tokio::spawn(run_mirror_loop(rx, sink))
}

async fn run_mirror_loop(mut rx: broadcast::Receiver<EventEnvelope>, sink: Arc<dyn StatsSink>) {
    tracing::info!("Statistics mirror started");

    loop {
        match rx.recv().await {
            Ok(envelope) => mirror(&envelope, sink.as_ref()).await,
            Err(broadcast::error::RecvError::Lagged(count)) => {
                tracing::warn!(count, "Statistics mirror lagged, {} events skipped", count);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("EventBus closed, stopping statistics mirror");
                break;
            }
        }
    }
}

async fn mirror(envelope: &EventEnvelope, sink: &dyn StatsSink) {
    let Some(document) = OrderStatsDocument::from_event(envelope) else {
        tracing::warn!(
            event_id = %envelope.id,
            order_number = envelope.event.order_number(),
            "Event carries no readable order snapshot, skipping"
        );
        return;
    };

    if let Err(e) = sink.record(&document).await {
        tracing::warn!(
            order_number = %document.order_number,
            error = %e,
            "Failed to mirror order statistics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::OrderEvent;
    use crate::core::money::Money;
    use crate::entities::{Address, Menu, OrderBuilder, User};
    use crate::pricing::PriceBreakdown;
    use anyhow::anyhow;
    use chrono::TimeZone;
    use serde_json::json;
    use std::time::Duration;

    fn order() -> Order {
        let user = User::new("Hugo", "Lefèvre", "hugo@example.fr", None);
        let menu = Menu::new("Plateau repas", Money::from_cents(1500), 8, None);
        let address = Address::new(user.id, "1 place de la Bourse", "33000", "Bordeaux", None);
        let delivery = Utc.with_ymd_and_hms(2026, 4, 15, 10, 0, 0).unwrap();
        OrderBuilder::new(&user, &menu, &address, 8, delivery)
            .pricing(PriceBreakdown {
                subtotal: Money::from_cents(12_000),
                delivery_cost: Money::from_cents(500),
                discount: None,
                total: Money::from_cents(12_500),
                distance_km: None,
            })
            .initialize("CMD-20260401-0000BEEF".to_string(), Utc::now())
            .unwrap()
    }

    struct FailingSink;

    #[async_trait]
    impl StatsSink for FailingSink {
        async fn record(&self, _document: &OrderStatsDocument) -> Result<()> {
            Err(anyhow!("document store unreachable"))
        }
    }

    #[test]
    fn test_document_from_event() {
        let order = order();
        let envelope = EventEnvelope::new(OrderEvent::created(&order));

        let doc = OrderStatsDocument::from_event(&envelope).unwrap();
        assert_eq!(doc.order_number, "CMD-20260401-0000BEEF");
        assert_eq!(doc.total_price, 12_500);
        assert_eq!(doc.status, OrderStatus::Pending);
        assert_eq!(doc.last_action, "created");
    }

    #[test]
    fn test_document_from_unreadable_snapshot() {
        let envelope = EventEnvelope::new(OrderEvent::MaterialReturned {
            order_id: Uuid::new_v4(),
            order_number: "CMD-X".to_string(),
            data: json!({"unexpected": true}),
        });
        assert!(OrderStatsDocument::from_event(&envelope).is_none());
    }

    #[test]
    fn test_document_skips_inconsistent_snapshot() {
        let order = order();
        let mut data = serde_json::to_value(&order).unwrap();
        data["has_material_loan"] = json!(true);

        let envelope = EventEnvelope::new(OrderEvent::Created {
            order_id: crate::core::Entity::id(&order),
            order_number: order.order_number().to_string(),
            data,
        });
        assert!(OrderStatsDocument::from_event(&envelope).is_none());
    }

    #[tokio::test]
    async fn test_mirror_upserts_by_order_number() {
        let bus = EventBus::new(16);
        let sink = Arc::new(InMemoryStatsSink::new());
        let handle = spawn_stats_mirror(&bus, sink.clone());

        let mut order = order();
        bus.publish(OrderEvent::created(&order));
        order.apply_status(OrderStatus::Validated, Utc::now());
        bus.publish(OrderEvent::status_changed(&order, OrderStatus::Pending));

        drop(bus);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sink.len().await, 1);
        let doc = sink.get("CMD-20260401-0000BEEF").await.unwrap();
        assert_eq!(doc.status, OrderStatus::Validated);
        assert_eq!(doc.last_action, "status_changed");
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_stop_mirror() {
        let bus = EventBus::new(16);
        let handle = spawn_stats_mirror(&bus, Arc::new(FailingSink));

        bus.publish(OrderEvent::created(&order()));
        bus.publish(OrderEvent::created(&order()));

        drop(bus);
        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.unwrap().is_ok());
    }
}

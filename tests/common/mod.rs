//! Shared fixtures for the order engine integration tests
//!
//! The clock is pinned to Monday 2026-03-02 10:00 UTC (11:00 in Paris, still
//! on winter time). Postal codes in 33xxx listed by the default zone
//! are local; everything else is resolved by [`StaticDistance`].

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use catering::prelude::*;
use chrono::TimeZone;
use std::sync::Arc;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
}

/// Thursday 2026-03-05 11:00 local: past the lead time and open
pub fn valid_delivery() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap()
}

/// Distance provider answering a fixed distance, or failing when `None`
pub struct StaticDistance(pub Option<f64>);

#[async_trait]
impl DistanceProvider for StaticDistance {
    async fn distance_from_depot(&self, _address: &str) -> Result<DistanceLookup> {
        match self.0 {
            Some(km) => Ok(DistanceLookup {
                distance_km: Some(km),
                is_local: false,
            }),
            None => Err(anyhow!("geocoding service unavailable")),
        }
    }
}

pub fn customer() -> (User, Address) {
    let user = User::new(
        "Camille",
        "Dubois",
        "camille.dubois@example.fr",
        Some("0611223344".to_string()),
    );
    let address = Address::new(user.id, "14 rue Notre-Dame", "33000", "Bordeaux", None);
    (user, address)
}

pub fn remote_customer(postal_code: &str) -> (User, Address) {
    let (user, _) = customer();
    let address = Address::new(user.id, "2 place du Marché", postal_code, "Libourne", None);
    (user, address)
}

pub fn buffet(stock: Option<u32>) -> Menu {
    Menu::new("Buffet bordelais", Money::from_cents(2500), 5, stock)
}

pub struct Harness {
    pub manager: OrderManager,
    pub orders: InMemoryOrderStore,
    pub menus: InMemoryMenuStore,
    pub notifier: RecordingNotifier,
    pub clock: FixedClock,
    pub bus: EventBus,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(
            CateringConfig::default_config(),
            RecordingNotifier::new(),
            Some(Arc::new(StaticDistance(Some(10.0)))),
        )
    }

    pub fn with_config(config: CateringConfig) -> Self {
        Self::build(config, RecordingNotifier::new(), Some(Arc::new(StaticDistance(Some(10.0)))))
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::build(
            CateringConfig::default_config(),
            notifier,
            Some(Arc::new(StaticDistance(Some(10.0)))),
        )
    }

    pub fn with_distance(provider: Option<Arc<dyn DistanceProvider>>) -> Self {
        Self::build(CateringConfig::default_config(), RecordingNotifier::new(), provider)
    }

    pub fn build(
        config: CateringConfig,
        notifier: RecordingNotifier,
        distance: Option<Arc<dyn DistanceProvider>>,
    ) -> Self {
        let orders = InMemoryOrderStore::new();
        let menus = InMemoryMenuStore::new();
        let clock = FixedClock::new(now());
        let bus = EventBus::new(64);

        let mut builder = OrderManagerBuilder::new()
            .with_order_store(orders.clone())
            .with_menu_store(menus.clone())
            .with_notifier(Arc::new(notifier.clone()))
            .with_clock(Arc::new(clock.clone()))
            .with_event_bus(bus.clone())
            .with_config(config);
        if let Some(provider) = distance {
            builder = builder.with_distance_provider(provider);
        }

        Self {
            manager: builder.build().unwrap(),
            orders,
            menus,
            notifier,
            clock,
            bus,
        }
    }

    /// Store a menu so that stock reservations can find it
    pub async fn add_menu(&self, menu: Menu) -> Menu {
        self.menus.create(menu).await.unwrap()
    }

    pub fn request(&self, menu: &Menu, persons: u32) -> OrderRequest {
        let (user, address) = customer();
        OrderRequest::new(user, menu.clone(), address, persons, valid_delivery())
    }

    /// Create and save an order for the local customer
    pub async fn place_order(&self, menu: &mut Menu, persons: u32, loan: bool) -> Order {
        let request = self.request(menu, persons).with_material_loan(loan);
        let order = self.manager.create_order(request).await.unwrap();
        self.manager.save_order(&order, Some(menu)).await.unwrap()
    }

    /// Walk the regular lifecycle up to `target`
    pub async fn advance_to(&self, order: &Order, target: OrderStatus) -> Order {
        const PATH: [OrderStatus; 5] = [
            OrderStatus::Validated,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
        ];

        let mut current = order.clone();
        for status in PATH {
            if current.status() == target {
                break;
            }
            current = self
                .manager
                .change_order_status(&current, status)
                .await
                .unwrap();
        }
        assert_eq!(current.status(), target, "{target} is not on the regular path");
        current
    }

    /// Persist an order in any status, bypassing the lifecycle
    pub async fn seed_order(&self, menu: &Menu, status: OrderStatus, loan: bool) -> Order {
        let request = self.request(menu, menu.min_persons).with_material_loan(loan);
        let order = self
            .manager
            .create_order(request)
            .await
            .unwrap()
            .fixture_with_status(status);
        self.orders.create(order).await.unwrap()
    }
}

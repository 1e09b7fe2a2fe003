//! OrderManagerBuilder for wiring the order engine's collaborators

use super::manager::OrderManager;
use super::validator::OrderStatusValidator;
use crate::config::CateringConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::error::{CateringError, CateringResult};
use crate::core::events::EventBus;
use crate::core::service::{MenuStore, OrderStore};
use crate::notify::{LogNotifier, NotificationRenderer, OrderNotifier};
use crate::pricing::{DeliveryResolver, DistanceProvider, PricingCalculator};
use crate::schedule::OpeningScheduleManager;
use std::sync::Arc;

/// Builder for [`OrderManager`]
///
/// Both stores are required. Without a notifier, notifications are rendered
/// and logged; without a distance provider, every address outside the local
/// zone gets the flat delivery fee.
///
/// # Example
///
/// ```ignore
/// let manager = OrderManagerBuilder::new()
///     .with_order_store(InMemoryOrderStore::new())
///     .with_menu_store(menus.clone())
///     .with_distance_provider(Arc::new(geocoder))
///     .with_config(CateringConfig::from_yaml_file("catering.yaml")?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct OrderManagerBuilder {
    orders: Option<Arc<dyn OrderStore>>,
    menus: Option<Arc<dyn MenuStore>>,
    distance_provider: Option<Arc<dyn DistanceProvider>>,
    notifier: Option<Arc<dyn OrderNotifier>>,
    clock: Option<Arc<dyn Clock>>,
    event_bus: Option<EventBus>,
    config: Option<CateringConfig>,
}

impl OrderManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the order store (required)
    pub fn with_order_store(mut self, store: impl OrderStore + 'static) -> Self {
        self.orders = Some(Arc::new(store));
        self
    }

    /// Set the menu store (required)
    pub fn with_menu_store(mut self, store: impl MenuStore + 'static) -> Self {
        self.menus = Some(Arc::new(store));
        self
    }

    pub fn with_distance_provider(mut self, provider: Arc<dyn DistanceProvider>) -> Self {
        self.distance_provider = Some(provider);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OrderNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing bus, e.g. one the statistics mirror already listens to
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn with_config(mut self, config: CateringConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate the configuration and assemble the manager
    pub fn build(self) -> CateringResult<OrderManager> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let orders = self.orders.ok_or_else(|| {
            CateringError::Internal("OrderStore is required. Call .with_order_store()".to_string())
        })?;
        let menus = self.menus.ok_or_else(|| {
            CateringError::Internal("MenuStore is required. Call .with_menu_store()".to_string())
        })?;

        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(LogNotifier::new(NotificationRenderer::new()?)),
        };

        let delivery = DeliveryResolver::new(
            config.delivery_zone.clone(),
            self.distance_provider,
            config.distance_timeout(),
        );
        let schedule = OpeningScheduleManager::new(config.schedule.clone(), config.lead_time());
        let events = self
            .event_bus
            .unwrap_or_else(|| EventBus::new(config.event_bus_capacity));

        tracing::debug!(
            lead_time_hours = config.lead_time_hours,
            zone_size = config.delivery_zone.postal_codes.len(),
            "Order manager built"
        );

        Ok(OrderManager {
            orders,
            menus,
            notifier,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            events,
            pricing: PricingCalculator::new(config.pricing.clone()),
            delivery,
            schedule,
            validator: OrderStatusValidator::new(),
            config,
        })
    }
}

//! # Catering-RS
//!
//! Order engine for a catering business: pricing, delivery windows, stock
//! reservation and the order status lifecycle.
//!
//! ## Features
//!
//! - **Integer Pricing**: Subtotal, distance-based delivery fee and large-order discount in cents
//! - **Status State Machine**: Transition table as data, with a pure validator on top
//! - **Opening Hours**: 48-hour lead time and weekly schedule checks with next-opening hints
//! - **Atomic Stock**: Reservation and status writes guarded at the persistence boundary
//! - **Snapshots**: Orders freeze customer, delivery and menu data at creation
//! - **Events**: Lifecycle events on a broadcast bus, mirrored into an analytics sink
//! - **Configuration-Based**: Fees, zones, deadlines and hours loaded from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catering::prelude::*;
//!
//! let menus = InMemoryMenuStore::with_entities([menu.clone()]);
//! let manager = OrderManagerBuilder::new()
//!     .with_order_store(InMemoryOrderStore::new())
//!     .with_menu_store(menus)
//!     .with_config(CateringConfig::from_yaml_file("catering.yaml")?)
//!     .build()?;
//!
//! let request = OrderRequest::new(user, menu.clone(), address, 12, delivery_at)
//!     .with_material_loan(true);
//! let order = manager.create_order(request).await?;
//! let order = manager.save_order(&order, Some(&mut menu)).await?;
//!
//! let order = manager.change_order_status(&order, OrderStatus::Validated).await?;
//! ```

pub mod analytics;
pub mod config;
pub mod core;
pub mod entities;
pub mod logging;
pub mod notify;
pub mod orders;
pub mod pricing;
pub mod schedule;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        clock::{Clock, FixedClock, SystemClock},
        entity::Entity,
        error::{CateringError, CateringResult, ConfigError, OrderError, ValidationError},
        events::{EventBus, EventEnvelope, OrderEvent},
        money::Money,
        query::{PaginatedResponse, QueryParams, SortDirection},
        service::{DataService, MenuStore, OrderStore},
    };

    // === Entities ===
    pub use crate::entities::{Address, Menu, Order, OrderBuilder, OrderStatus, User};

    // === Orders ===
    pub use crate::orders::{
        OrderFilter, OrderFilterService, OrderManager, OrderManagerBuilder, OrderRequest,
        OrderStatistics, OrderStatisticsService, OrderStatusValidator, StatusCheck,
    };

    // === Pricing & Schedule ===
    pub use crate::pricing::{
        DeliveryDistance, DeliveryZone, DistanceLookup, DistanceProvider, PriceBreakdown,
        PricingCalculator, PricingConfig,
    };
    pub use crate::schedule::{OpeningHours, OpeningSchedule, OpeningScheduleManager};

    // === Notifications & Analytics ===
    pub use crate::analytics::{InMemoryStatsSink, OrderStatsDocument, StatsSink, spawn_stats_mirror};
    pub use crate::notify::{LogNotifier, NotificationRenderer, OrderNotifier, RecordingNotifier};

    // === Storage ===
    pub use crate::storage::{InMemoryDataService, InMemoryMenuStore, InMemoryOrderStore};

    // === Config ===
    pub use crate::config::{CateringConfig, MaterialLoanConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Duration, Utc};
    pub use uuid::Uuid;
}

//! Order orchestration: creation, persistence, status changes and cancellation
//!
//! Every change follows the same sequence:
//!
//! ```text
//! reload persisted order ─▶ validate ─▶ apply ─▶ compare-and-swap write
//!                                                 ─▶ publish event ─▶ notify (best effort)
//! ```
//!
//! Domain errors propagate to the caller. Notification failures are logged
//! and never undo a committed change.

use super::number::generate_order_number;
use super::validator::{OrderStatusValidator, StatusCheck};
use crate::config::CateringConfig;
use crate::core::clock::Clock;
use crate::core::entity::Entity;
use crate::core::error::{CateringError, CateringResult, OrderError, ValidationError};
use crate::core::events::{EventBus, OrderEvent};
use crate::core::service::{MenuStore, OrderStore};
use crate::entities::{Address, Menu, Order, OrderBuilder, OrderStatus, User};
use crate::notify::OrderNotifier;
use crate::pricing::{DeliveryResolver, PriceBreakdown, PricingCalculator};
use crate::schedule::OpeningScheduleManager;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Attempts at drawing an order number not already taken
const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Everything needed to create an order
#[derive(Debug, Clone, Validate)]
pub struct OrderRequest {
    #[validate(nested)]
    pub user: User,
    pub menu: Menu,
    #[validate(nested)]
    pub address: Address,
    #[validate(range(min = 1, message = "at least one person is required"))]
    pub number_of_persons: u32,
    pub delivery_datetime: DateTime<Utc>,
    pub has_material_loan: bool,
}

impl OrderRequest {
    pub fn new(
        user: User,
        menu: Menu,
        address: Address,
        number_of_persons: u32,
        delivery_datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            user,
            menu,
            address,
            number_of_persons,
            delivery_datetime,
            has_material_loan: false,
        }
    }

    pub fn with_material_loan(mut self, has_material_loan: bool) -> Self {
        self.has_material_loan = has_material_loan;
        self
    }
}

/// Orchestrates the order lifecycle
///
/// Built with [`OrderManagerBuilder`](super::OrderManagerBuilder).
pub struct OrderManager {
    pub(super) orders: Arc<dyn OrderStore>,
    pub(super) menus: Arc<dyn MenuStore>,
    pub(super) notifier: Arc<dyn OrderNotifier>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) events: EventBus,
    pub(super) pricing: PricingCalculator,
    pub(super) delivery: DeliveryResolver,
    pub(super) schedule: OpeningScheduleManager,
    pub(super) validator: OrderStatusValidator,
    pub(super) config: CateringConfig,
}

impl OrderManager {
    pub fn config(&self) -> &CateringConfig {
        &self.config
    }

    pub fn schedule(&self) -> &OpeningScheduleManager {
        &self.schedule
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Earliest delivery an order placed now could request
    pub fn earliest_delivery(&self) -> Option<DateTime<Utc>> {
        self.schedule.earliest_delivery(self.clock.now())
    }

    /// Price an order without creating it
    pub async fn preview_price(
        &self,
        menu: &Menu,
        address: &Address,
        number_of_persons: u32,
    ) -> PriceBreakdown {
        let distance = self
            .delivery
            .resolve(&address.postal_code, &address.formatted())
            .await;
        self.pricing.quote(
            menu.price_per_person,
            number_of_persons,
            menu.min_persons,
            &distance,
        )
    }

    /// Validate a request and build the corresponding order
    ///
    /// The order is returned in PENDING status and is not persisted; call
    /// [`save_order`](Self::save_order) to commit it.
    pub async fn create_order(&self, request: OrderRequest) -> CateringResult<Order> {
        request.validate()?;

        let menu = &request.menu;
        let persons = request.number_of_persons;

        if persons < menu.min_persons {
            return Err(ValidationError::FieldError {
                field: "number_of_persons".to_string(),
                message: format!(
                    "menu '{}' requires at least {} persons",
                    menu.name, menu.min_persons
                ),
            }
            .into());
        }

        menu.ensure_capacity(persons)?;

        let now = self.clock.now();
        self.schedule
            .check_delivery(request.delivery_datetime, now)?;

        let breakdown = self
            .preview_price(menu, &request.address, persons)
            .await;
        tracing::debug!(
            menu = %menu.name,
            persons,
            subtotal = %breakdown.subtotal,
            delivery_cost = %breakdown.delivery_cost,
            total = %breakdown.total,
            "Order priced"
        );

        let mut builder = OrderBuilder::new(
            &request.user,
            menu,
            &request.address,
            persons,
            request.delivery_datetime,
        )
        .pricing(breakdown);

        if request.has_material_loan {
            builder = builder
                .material_loan(request.delivery_datetime + self.config.creation_return_deadline());
        }

        let order_number = self.next_order_number(now).await?;
        let order = builder.initialize(order_number, now)?;

        tracing::info!(
            order_number = order.order_number(),
            user_id = %order.user_id(),
            menu = order.menu_name(),
            total = %order.total_price(),
            "Order created"
        );
        Ok(order)
    }

    /// Persist a new order and take its persons from the menu stock
    ///
    /// With a menu, the stock is reserved atomically in the menu store and
    /// the caller's copy is updated to match. Without one the stock is left
    /// untouched. If the order cannot be stored the reservation is released.
    pub async fn save_order(&self, order: &Order, menu: Option<&mut Menu>) -> CateringResult<Order> {
        let reserved = match menu {
            Some(menu) => {
                if menu.id != order.menu_id() {
                    return Err(ValidationError::FieldError {
                        field: "menu".to_string(),
                        message: format!(
                            "menu {} does not match order menu {}",
                            menu.id,
                            order.menu_id()
                        ),
                    }
                    .into());
                }
                let stored = self
                    .menus
                    .reserve_stock(&menu.id, order.number_of_persons())
                    .await?;
                menu.stock = stored.stock;
                menu.updated_at = stored.updated_at;
                true
            }
            None => false,
        };

        let saved = match self.orders.create(order.clone()).await {
            Ok(saved) => saved,
            Err(e) => {
                if reserved {
                    self.release_reservation(order).await;
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            order_number = saved.order_number(),
            persons = saved.number_of_persons(),
            stock_reserved = reserved,
            "Order saved"
        );

        self.events.publish(OrderEvent::created(&saved));

        if let Err(e) = self.notifier.send_order_confirmation(&saved).await {
            tracing::warn!(
                order_number = saved.order_number(),
                error = %e,
                "Failed to send order confirmation"
            );
        }

        Ok(saved)
    }

    async fn release_reservation(&self, order: &Order) {
        if let Err(e) = self
            .menus
            .release_stock(&order.menu_id(), order.number_of_persons())
            .await
        {
            tracing::error!(
                order_number = order.order_number(),
                menu_id = %order.menu_id(),
                persons = order.number_of_persons(),
                error = %e,
                "Failed to release stock after order persistence failure"
            );
        }
    }

    /// Check a status change without applying it
    pub fn validate_status_change(&self, order: &Order, target: OrderStatus) -> StatusCheck {
        self.validator.validate_status_change(order, target)
    }

    /// Move an order to a new status
    ///
    /// The check runs against the persisted order, and the write only
    /// succeeds if nobody changed the status in between. Cancellation needs a
    /// reason and goes through [`cancel_order`](Self::cancel_order).
    pub async fn change_order_status(&self, order: &Order, target: OrderStatus) -> CateringResult<Order> {
        if target == OrderStatus::Cancelled {
            return Err(ValidationError::MissingArgument {
                argument: "cancellation_reason".to_string(),
            }
            .into());
        }

        let current = self.load(&order.id()).await?;
        let from = current.status();
        self.validator
            .validate_status_change(&current, target)
            .into_result(from, target)?;

        let now = self.clock.now();
        let mut updated = current;
        updated.apply_status(target, now);
        if target == OrderStatus::WaitingMaterialReturn {
            updated.set_material_return_deadline(
                updated.delivery_datetime() + self.config.material_return_deadline(),
            );
        }

        let saved = self.orders.update_if_status(updated, from).await?;
        tracing::info!(
            order_number = saved.order_number(),
            from = %from,
            to = %target,
            "Order status changed"
        );

        self.events.publish(OrderEvent::status_changed(&saved, from));
        self.notify_status(&saved, target).await;

        Ok(saved)
    }

    /// Cancel an order that is not completed or already cancelled
    ///
    /// Bypasses the transition table. Stock is not given back.
    pub async fn cancel_order(&self, order: &Order, reason: &str) -> CateringResult<Order> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::FieldError {
                field: "cancellation_reason".to_string(),
                message: "a cancellation reason is required".to_string(),
            }
            .into());
        }

        let current = self.load(&order.id()).await?;
        if !current.can_be_cancelled() {
            return Err(OrderError::NotCancellable {
                order_number: current.order_number().to_string(),
                status: current.status(),
            }
            .into());
        }

        let from = current.status();
        let mut updated = current;
        updated.cancel(reason.to_string(), self.clock.now());

        let saved = self.orders.update_if_status(updated, from).await?;
        tracing::info!(
            order_number = saved.order_number(),
            from = %from,
            reason,
            "Order cancelled"
        );

        self.events.publish(OrderEvent::cancelled(&saved));
        self.notify_status(&saved, OrderStatus::Cancelled).await;

        Ok(saved)
    }

    /// Record that loaned material came back
    ///
    /// An order waiting for its material is completed in the same write.
    /// Marking an already returned order again is a no-op.
    pub async fn mark_material_returned(&self, order: &Order) -> CateringResult<Order> {
        let current = self.load(&order.id()).await?;
        if !current.has_material_loan() {
            return Err(ValidationError::FieldError {
                field: "material_returned".to_string(),
                message: "no material loan on this order".to_string(),
            }
            .into());
        }
        if current.material_returned() {
            return Ok(current);
        }

        let from = current.status();
        let now = self.clock.now();
        let mut updated = current;
        updated.mark_material_returned(now);

        let completes = from == OrderStatus::WaitingMaterialReturn;
        if completes {
            self.validator
                .validate_status_change(&updated, OrderStatus::Completed)
                .into_result(from, OrderStatus::Completed)?;
            updated.apply_status(OrderStatus::Completed, now);
        }

        let saved = self.orders.update_if_status(updated, from).await?;
        tracing::info!(
            order_number = saved.order_number(),
            completed = completes,
            "Material returned"
        );

        self.events.publish(OrderEvent::material_returned(&saved));
        if completes {
            self.events.publish(OrderEvent::status_changed(&saved, from));
            self.notify_status(&saved, OrderStatus::Completed).await;
        }

        Ok(saved)
    }

    pub async fn get_order(&self, id: &Uuid) -> CateringResult<Order> {
        self.load(id).await
    }

    pub async fn get_order_by_number(&self, order_number: &str) -> CateringResult<Option<Order>> {
        Ok(self.orders.find_by_number(order_number).await?)
    }

    /// Orders placed by a user, most recent first
    pub async fn orders_for_user(&self, user_id: &Uuid) -> CateringResult<Vec<Order>> {
        Ok(self.orders.find_by_user(user_id).await?)
    }

    async fn load(&self, id: &Uuid) -> CateringResult<Order> {
        self.orders.get(id).await?.ok_or_else(|| {
            OrderError::NotFound {
                entity_type: Order::resource_name_singular().to_string(),
                id: *id,
            }
            .into()
        })
    }

    async fn next_order_number(&self, now: DateTime<Utc>) -> CateringResult<String> {
        let prefix = &self.config.order_number_prefix;
        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            let candidate = generate_order_number(prefix, now);
            if self.orders.find_by_number(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            tracing::debug!(order_number = %candidate, "Order number already taken, drawing again");
        }
        Err(CateringError::Internal(
            "could not allocate a unique order number".to_string(),
        ))
    }

    async fn notify_status(&self, order: &Order, status: OrderStatus) {
        let review_url =
            (status == OrderStatus::Completed).then(|| self.config.review_url(order.order_number()));

        if let Err(e) = self
            .notifier
            .send_status_change_notification(order, status, review_url.as_deref())
            .await
        {
            tracing::warn!(
                order_number = order.order_number(),
                status = %status,
                error = %e,
                "Failed to send status change notification"
            );
        }
    }
}

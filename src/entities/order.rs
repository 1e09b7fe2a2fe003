//! Order aggregate
//!
//! An order is a frozen record of what was agreed: customer, delivery and
//! menu data are copied in when the order is built and never re-derived from
//! their sources. Fields are private; the only ways to change an order after
//! [`OrderBuilder::initialize`] are the crate-internal transitions applied by
//! the order manager.

use super::customer::{Address, User};
use super::menu::Menu;
use super::status::OrderStatus;
use crate::core::error::{CateringError, CateringResult};
use crate::core::money::Money;
use crate::impl_entity;
use crate::pricing::PriceBreakdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deserialization runs [`Order::check_invariants`], so a stored or mirrored
/// record that breaks them is rejected instead of loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct Order {
    id: Uuid,
    order_number: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    user_id: Uuid,
    menu_id: Uuid,

    customer_first_name: String,
    customer_last_name: String,
    customer_email: String,
    customer_phone: Option<String>,

    delivery_address: String,
    delivery_postal_code: String,
    delivery_datetime: DateTime<Utc>,
    /// `None` for the local zone or when the distance could not be resolved
    delivery_distance_km: Option<f64>,

    menu_name: String,
    menu_price_per_person: Money,
    number_of_persons: u32,

    subtotal: Money,
    delivery_cost: Money,
    /// `None` means no discount applies, which is not the same as a zero discount
    discount_amount: Option<Money>,
    total_price: Money,

    has_material_loan: bool,
    material_return_deadline: Option<DateTime<Utc>>,
    material_returned: bool,

    status: OrderStatus,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
}

impl_entity!(Order, "order", "orders", unique = order_number);

/// Wire shape of an [`Order`] before its invariants are checked
#[derive(Deserialize)]
struct OrderRecord {
    id: Uuid,
    order_number: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_id: Uuid,
    menu_id: Uuid,
    customer_first_name: String,
    customer_last_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    delivery_address: String,
    delivery_postal_code: String,
    delivery_datetime: DateTime<Utc>,
    delivery_distance_km: Option<f64>,
    menu_name: String,
    menu_price_per_person: Money,
    number_of_persons: u32,
    subtotal: Money,
    delivery_cost: Money,
    discount_amount: Option<Money>,
    total_price: Money,
    has_material_loan: bool,
    material_return_deadline: Option<DateTime<Utc>>,
    material_returned: bool,
    status: OrderStatus,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = String;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let order = Order {
            id: record.id,
            order_number: record.order_number,
            created_at: record.created_at,
            updated_at: record.updated_at,
            user_id: record.user_id,
            menu_id: record.menu_id,
            customer_first_name: record.customer_first_name,
            customer_last_name: record.customer_last_name,
            customer_email: record.customer_email,
            customer_phone: record.customer_phone,
            delivery_address: record.delivery_address,
            delivery_postal_code: record.delivery_postal_code,
            delivery_datetime: record.delivery_datetime,
            delivery_distance_km: record.delivery_distance_km,
            menu_name: record.menu_name,
            menu_price_per_person: record.menu_price_per_person,
            number_of_persons: record.number_of_persons,
            subtotal: record.subtotal,
            delivery_cost: record.delivery_cost,
            discount_amount: record.discount_amount,
            total_price: record.total_price,
            has_material_loan: record.has_material_loan,
            material_return_deadline: record.material_return_deadline,
            material_returned: record.material_returned,
            status: record.status,
            cancelled_at: record.cancelled_at,
            cancellation_reason: record.cancellation_reason,
        };
        order.check_invariants()?;
        Ok(order)
    }
}

impl Order {
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn menu_id(&self) -> Uuid {
        self.menu_id
    }

    pub fn customer_first_name(&self) -> &str {
        &self.customer_first_name
    }

    pub fn customer_last_name(&self) -> &str {
        &self.customer_last_name
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn customer_phone(&self) -> Option<&str> {
        self.customer_phone.as_deref()
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn delivery_postal_code(&self) -> &str {
        &self.delivery_postal_code
    }

    pub fn delivery_datetime(&self) -> DateTime<Utc> {
        self.delivery_datetime
    }

    pub fn delivery_distance_km(&self) -> Option<f64> {
        self.delivery_distance_km
    }

    pub fn menu_name(&self) -> &str {
        &self.menu_name
    }

    pub fn menu_price_per_person(&self) -> Money {
        self.menu_price_per_person
    }

    pub fn number_of_persons(&self) -> u32 {
        self.number_of_persons
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn delivery_cost(&self) -> Money {
        self.delivery_cost
    }

    pub fn discount_amount(&self) -> Option<Money> {
        self.discount_amount
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn has_material_loan(&self) -> bool {
        self.has_material_loan
    }

    pub fn material_return_deadline(&self) -> Option<DateTime<Utc>> {
        self.material_return_deadline
    }

    pub fn material_returned(&self) -> bool {
        self.material_returned
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn customer_full_name(&self) -> String {
        format!("{} {}", self.customer_first_name, self.customer_last_name)
    }

    pub fn can_be_cancelled(&self) -> bool {
        self.status.can_be_cancelled()
    }

    /// Loan granted and equipment still out
    pub fn is_material_pending(&self) -> bool {
        self.has_material_loan && !self.material_returned
    }

    /// Check the aggregate invariants, returning the first violation
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.number_of_persons == 0 {
            return Err("number of persons must be positive".to_string());
        }
        let expected = self.subtotal + self.delivery_cost - self.discount_amount.unwrap_or_default();
        if self.total_price != expected {
            return Err(format!(
                "total {} does not match subtotal + delivery - discount ({})",
                self.total_price, expected
            ));
        }
        if self.has_material_loan != self.material_return_deadline.is_some() {
            return Err("material return deadline must be set iff a material loan exists".to_string());
        }
        if (self.status == OrderStatus::Cancelled) != self.cancelled_at.is_some() {
            return Err("cancelled_at must be set iff the order is cancelled".to_string());
        }
        Ok(())
    }

    // === Transitions applied by the order manager ===

    pub(crate) fn apply_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub(crate) fn set_material_return_deadline(&mut self, deadline: DateTime<Utc>) {
        if self.has_material_loan {
            self.material_return_deadline = Some(deadline);
        }
    }

    pub(crate) fn mark_material_returned(&mut self, now: DateTime<Utc>) {
        self.material_returned = true;
        self.updated_at = now;
    }

    pub(crate) fn cancel(&mut self, reason: String, now: DateTime<Utc>) {
        self.cancellation_reason = Some(reason);
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }

    /// Force a status without running any transition rule.
    ///
    /// Bypasses the lifecycle invariants: fixtures and tests only.
    #[doc(hidden)]
    pub fn fixture_with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        if status == OrderStatus::Cancelled && self.cancelled_at.is_none() {
            self.cancelled_at = Some(self.updated_at);
        }
        self
    }

    /// Force the returned flag. Fixtures and tests only.
    #[doc(hidden)]
    pub fn fixture_with_material_returned(mut self, returned: bool) -> Self {
        self.material_returned = returned;
        self
    }
}

/// Collects the snapshots and pricing of an order before it exists
///
/// # Example
///
/// ```rust,ignore
/// let order = OrderBuilder::new(&user, &menu, &address, 12, delivery_at)
///     .pricing(breakdown)
///     .material_loan(delivery_at + Duration::days(10))
///     .initialize(order_number, now)?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    user_id: Uuid,
    menu_id: Uuid,
    customer_first_name: String,
    customer_last_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    delivery_address: String,
    delivery_postal_code: String,
    delivery_datetime: DateTime<Utc>,
    menu_name: String,
    menu_price_per_person: Money,
    number_of_persons: u32,
    pricing: Option<PriceBreakdown>,
    material_return_deadline: Option<DateTime<Utc>>,
}

impl OrderBuilder {
    /// Copy customer, delivery and menu data into a new draft
    ///
    /// The contact phone is the address phone when present, the user's otherwise.
    pub fn new(
        user: &User,
        menu: &Menu,
        address: &Address,
        number_of_persons: u32,
        delivery_datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user.id,
            menu_id: menu.id,
            customer_first_name: user.first_name.clone(),
            customer_last_name: user.last_name.clone(),
            customer_email: user.email.clone(),
            customer_phone: address.phone.clone().or_else(|| user.phone.clone()),
            delivery_address: address.formatted(),
            delivery_postal_code: address.postal_code.trim().to_string(),
            delivery_datetime,
            menu_name: menu.name.clone(),
            menu_price_per_person: menu.price_per_person,
            number_of_persons,
            pricing: None,
            material_return_deadline: None,
        }
    }

    pub fn pricing(mut self, breakdown: PriceBreakdown) -> Self {
        self.pricing = Some(breakdown);
        self
    }

    /// Request a material loan with the given return deadline
    pub fn material_loan(mut self, return_deadline: DateTime<Utc>) -> Self {
        self.material_return_deadline = Some(return_deadline);
        self
    }

    /// Assign the order number, PENDING status and creation timestamp
    pub fn initialize(self, order_number: String, now: DateTime<Utc>) -> CateringResult<Order> {
        let pricing = self
            .pricing
            .ok_or_else(|| CateringError::Internal("order initialized without pricing".to_string()))?;

        let order = Order {
            id: Uuid::new_v4(),
            order_number,
            created_at: now,
            updated_at: now,
            user_id: self.user_id,
            menu_id: self.menu_id,
            customer_first_name: self.customer_first_name,
            customer_last_name: self.customer_last_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            delivery_address: self.delivery_address,
            delivery_postal_code: self.delivery_postal_code,
            delivery_datetime: self.delivery_datetime,
            delivery_distance_km: pricing.distance_km,
            menu_name: self.menu_name,
            menu_price_per_person: self.menu_price_per_person,
            number_of_persons: self.number_of_persons,
            subtotal: pricing.subtotal,
            delivery_cost: pricing.delivery_cost,
            discount_amount: pricing.discount,
            total_price: pricing.total,
            has_material_loan: self.material_return_deadline.is_some(),
            material_return_deadline: self.material_return_deadline,
            material_returned: false,
            status: OrderStatus::Pending,
            cancelled_at: None,
            cancellation_reason: None,
        };

        order.check_invariants().map_err(CateringError::Internal)?;
        Ok(order)
    }
}

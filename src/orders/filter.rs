//! Read-side order search: filter, sort and paginate persisted orders

use crate::core::entity::Entity;
use crate::core::error::{CateringResult, ValidationError};
use crate::core::query::{PaginatedResponse, QueryParams, SortDirection};
use crate::core::service::OrderStore;
use crate::entities::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Criteria an order must meet; unset fields match everything
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
    /// Case-insensitive exact match
    pub customer_email: Option<String>,
    /// Case-insensitive substring match
    pub menu_name: Option<String>,
    /// Inclusive lower bound on the delivery date-time
    pub delivery_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the delivery date-time
    pub delivery_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_menu_name(mut self, menu_name: impl Into<String>) -> Self {
        self.menu_name = Some(menu_name.into());
        self
    }

    pub fn with_delivery_window(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.delivery_from = Some(from);
        self.delivery_to = Some(to);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| order.status() == s)
            && self.user_id.is_none_or(|id| order.user_id() == id)
            && self
                .customer_email
                .as_deref()
                .is_none_or(|email| order.customer_email().eq_ignore_ascii_case(email.trim()))
            && self.menu_name.as_deref().is_none_or(|name| {
                order
                    .menu_name()
                    .to_lowercase()
                    .contains(&name.trim().to_lowercase())
            })
            && self
                .delivery_from
                .is_none_or(|from| order.delivery_datetime() >= from)
            && self
                .delivery_to
                .is_none_or(|to| order.delivery_datetime() < to)
    }
}

/// Fields orders can be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortField {
    CreatedAt,
    DeliveryDatetime,
    TotalPrice,
    OrderNumber,
    Status,
}

impl SortField {
    fn parse(field: &str) -> Option<Self> {
        match field {
            "created_at" => Some(SortField::CreatedAt),
            "delivery_datetime" => Some(SortField::DeliveryDatetime),
            "total_price" => Some(SortField::TotalPrice),
            "order_number" => Some(SortField::OrderNumber),
            "status" => Some(SortField::Status),
            _ => None,
        }
    }

    fn compare(self, a: &Order, b: &Order) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortField::DeliveryDatetime => a.delivery_datetime().cmp(&b.delivery_datetime()),
            SortField::TotalPrice => a.total_price().cmp(&b.total_price()),
            SortField::OrderNumber => a.order_number().cmp(b.order_number()),
            SortField::Status => a.status().cmp(&b.status()),
        }
    }
}

/// Search over persisted orders
#[derive(Clone)]
pub struct OrderFilterService {
    orders: Arc<dyn OrderStore>,
}

impl OrderFilterService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Filter, sort and cut one page
    ///
    /// Sorts by `created_at:desc` unless `params.sort` says otherwise.
    pub async fn search(
        &self,
        filter: &OrderFilter,
        params: &QueryParams,
    ) -> CateringResult<PaginatedResponse<Order>> {
        let (field, direction) = match params.sort_spec() {
            Some((name, direction)) => {
                let field = SortField::parse(name).ok_or_else(|| ValidationError::FieldError {
                    field: "sort".to_string(),
                    message: format!("cannot sort orders by '{name}'"),
                })?;
                (field, direction)
            }
            None => (SortField::CreatedAt, SortDirection::Desc),
        };

        let mut found: Vec<Order> = self
            .orders
            .list()
            .await?
            .into_iter()
            .filter(|order| filter.matches(order))
            .collect();

        found.sort_by(|a, b| {
            let ordering = field.compare(a, b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        Ok(PaginatedResponse::paginate(found, params))
    }

    /// Loans still out after their return deadline, oldest deadline first
    pub async fn overdue_material_returns(&self, now: DateTime<Utc>) -> CateringResult<Vec<Order>> {
        let mut overdue: Vec<Order> = self
            .orders
            .list()
            .await?
            .into_iter()
            .filter(|order| {
                order.status() != OrderStatus::Cancelled
                    && order.is_material_pending()
                    && order.material_return_deadline().is_some_and(|d| d < now)
            })
            .collect();
        overdue.sort_by_key(|order| order.material_return_deadline());
        Ok(overdue)
    }
}

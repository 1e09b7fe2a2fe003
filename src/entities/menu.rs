//! Menu entity: the sellable offer an order is placed against

use crate::core::error::OrderError;
use crate::core::money::Money;
use crate::impl_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catering menu with a per-person price and an optional stock ceiling
///
/// `stock` counts persons that can still be served. `None` means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub price_per_person: Money,
    /// Minimum number of persons an order must cover
    pub min_persons: u32,
    pub stock: Option<u32>,
}

impl_entity!(Menu, "menu", "menus");

impl Menu {
    pub fn new(
        name: impl Into<String>,
        price_per_person: Money,
        min_persons: u32,
        stock: Option<u32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: name.into(),
            description: None,
            price_per_person,
            min_persons,
            stock,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Unlimited stock, or at least one place left
    pub fn is_available(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }

    pub fn stock(&self) -> Option<u32> {
        self.stock
    }

    /// Check that `persons` places can be taken from the stock
    pub fn ensure_capacity(&self, persons: u32) -> Result<(), OrderError> {
        match self.stock {
            None => Ok(()),
            Some(0) => Err(OrderError::MenuUnavailable {
                menu_name: self.name.clone(),
            }),
            Some(remaining) if remaining < persons => Err(OrderError::InsufficientStock {
                remaining,
                requested: persons,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Take `persons` places from a bounded stock
    ///
    /// Unlimited menus are left untouched.
    pub fn decrement_stock(&mut self, persons: u32) -> Result<(), OrderError> {
        self.ensure_capacity(persons)?;
        if let Some(remaining) = self.stock.as_mut() {
            *remaining -= persons;
            self.touch();
        }
        Ok(())
    }

    /// Give places back to a bounded stock
    pub fn increment_stock(&mut self, persons: u32) {
        if let Some(remaining) = self.stock.as_mut() {
            *remaining = remaining.saturating_add(persons);
            self.touch();
        }
    }

    pub fn set_price(&mut self, price_per_person: Money) {
        self.price_per_person = price_per_person;
        self.touch();
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Update the updated_at timestamp to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

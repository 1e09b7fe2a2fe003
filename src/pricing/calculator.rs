//! Order price computation
//!
//! Pure and synchronous: the distance has already been resolved by the
//! [`DeliveryResolver`](super::DeliveryResolver) when the calculator runs.

use crate::core::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Pricing constants, injected through configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Flat delivery fee charged on every order (cents)
    pub base_delivery_fee: Money,
    /// Fee per started kilometre outside the local zone (cents)
    pub per_km_fee: Money,
    /// Discount percentage for large orders
    pub discount_percent: u32,
    /// Persons above the menu minimum needed to earn the discount
    pub discount_threshold: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_delivery_fee: Money::from_cents(500),
            per_km_fee: Money::from_cents(59),
            discount_percent: 10,
            discount_threshold: 5,
        }
    }
}

/// Postal codes delivered at the flat fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub postal_codes: BTreeSet<String>,
}

impl DeliveryZone {
    pub fn new<I, S>(postal_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            postal_codes: postal_codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, postal_code: &str) -> bool {
        self.postal_codes.contains(postal_code.trim())
    }
}

impl Default for DeliveryZone {
    /// Bordeaux
    fn default() -> Self {
        Self::new(["33000", "33100", "33200", "33300", "33800"])
    }
}

/// Resolved delivery distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliveryDistance {
    /// Inside the local zone, flat fee
    Local,
    /// Road distance from the depot
    Remote { km: f64 },
    /// Lookup failed; the flat fee applies
    Unknown,
}

impl DeliveryDistance {
    /// Distance to record on the order
    pub fn recorded_km(&self) -> Option<f64> {
        match self {
            DeliveryDistance::Remote { km } => Some(*km),
            DeliveryDistance::Local | DeliveryDistance::Unknown => None,
        }
    }
}

/// Result of a price computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub delivery_cost: Money,
    pub discount: Option<Money>,
    pub total: Money,
    pub distance_km: Option<f64>,
}

/// Computes subtotal, delivery cost, discount and total
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    config: PricingConfig,
}

impl PricingCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn subtotal(&self, price_per_person: Money, persons: u32) -> Money {
        price_per_person.times(persons)
    }

    /// Flat fee, plus the per-kilometre fee on every started kilometre outside the zone
    pub fn delivery_cost(&self, distance: &DeliveryDistance) -> Money {
        match distance {
            DeliveryDistance::Local | DeliveryDistance::Unknown => self.config.base_delivery_fee,
            DeliveryDistance::Remote { km } => {
                let started_km = km.max(0.0).ceil() as u32;
                self.config.base_delivery_fee + self.config.per_km_fee.times(started_km)
            }
        }
    }

    /// Discount when the order exceeds the menu minimum by the threshold
    ///
    /// Returns `None` (not zero) when no discount applies.
    pub fn discount(&self, subtotal: Money, persons: u32, menu_min_persons: u32) -> Option<Money> {
        let extra = persons.saturating_sub(menu_min_persons);
        if persons >= menu_min_persons && extra >= self.config.discount_threshold {
            Some(subtotal.percent_floor(self.config.discount_percent))
        } else {
            None
        }
    }

    pub fn quote(
        &self,
        price_per_person: Money,
        persons: u32,
        menu_min_persons: u32,
        distance: &DeliveryDistance,
    ) -> PriceBreakdown {
        let subtotal = self.subtotal(price_per_person, persons);
        let delivery_cost = self.delivery_cost(distance);
        let discount = self.discount(subtotal, persons, menu_min_persons);
        let total = subtotal + delivery_cost - discount.unwrap_or_default();

        PriceBreakdown {
            subtotal,
            delivery_cost,
            discount,
            total,
            distance_km: distance.recorded_km(),
        }
    }
}

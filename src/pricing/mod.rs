//! Delivery distance resolution and price computation

pub mod calculator;
pub mod distance;

pub use calculator::{DeliveryDistance, DeliveryZone, PriceBreakdown, PricingCalculator, PricingConfig};
pub use distance::{DeliveryResolver, DistanceLookup, DistanceProvider};

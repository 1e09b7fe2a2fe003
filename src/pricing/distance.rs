//! Delivery distance resolution
//!
//! The road-distance lookup is an external HTTP collaborator. It may fail or
//! hang; [`DeliveryResolver`] bounds it with a timeout and degrades to
//! [`DeliveryDistance::Unknown`] so that order creation never blocks on it.

use super::calculator::{DeliveryDistance, DeliveryZone};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Answer of a distance lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceLookup {
    /// Road distance from the depot, if the address could be geocoded
    pub distance_km: Option<f64>,
    /// The provider placed the address inside the local zone
    pub is_local: bool,
}

/// Resolves a postal address to a road distance from the depot
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    async fn distance_from_depot(&self, address: &str) -> Result<DistanceLookup>;
}

/// Combines the local postal-code zone with the distance provider
#[derive(Clone)]
pub struct DeliveryResolver {
    zone: DeliveryZone,
    provider: Option<Arc<dyn DistanceProvider>>,
    timeout: Duration,
}

impl DeliveryResolver {
    pub fn new(
        zone: DeliveryZone,
        provider: Option<Arc<dyn DistanceProvider>>,
        timeout: Duration,
    ) -> Self {
        Self {
            zone,
            provider,
            timeout,
        }
    }

    pub fn zone(&self) -> &DeliveryZone {
        &self.zone
    }

    /// Local postal codes never reach the provider
    pub async fn resolve(&self, postal_code: &str, address: &str) -> DeliveryDistance {
        if self.zone.contains(postal_code) {
            return DeliveryDistance::Local;
        }

        let Some(provider) = &self.provider else {
            tracing::debug!(address, "No distance provider configured, using base delivery fee");
            return DeliveryDistance::Unknown;
        };

        match tokio::time::timeout(self.timeout, provider.distance_from_depot(address)).await {
            Ok(Ok(lookup)) if lookup.is_local => DeliveryDistance::Local,
            Ok(Ok(DistanceLookup {
                distance_km: Some(km),
                ..
            })) if km.is_finite() && km >= 0.0 => DeliveryDistance::Remote { km },
            Ok(Ok(lookup)) => {
                tracing::warn!(address, ?lookup, "Distance lookup returned no usable distance");
                DeliveryDistance::Unknown
            }
            Ok(Err(e)) => {
                tracing::warn!(address, error = %e, "Distance lookup failed, using base delivery fee");
                DeliveryDistance::Unknown
            }
            Err(_) => {
                tracing::warn!(
                    address,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Distance lookup timed out, using base delivery fee"
                );
                DeliveryDistance::Unknown
            }
        }
    }
}

//! Persistence ports for entities, orders and menus

use crate::core::entity::Entity;
use crate::core::error::CateringResult;
use crate::entities::{Menu, Order, OrderStatus};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Service trait for managing persisted entities
///
/// Implementations provide basic persistence for a specific entity type.
/// The order engine is agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DataService<T: Entity>: Send + Sync {
    /// Create a new entity
    async fn create(&self, entity: T) -> Result<T>;

    /// Get an entity by ID
    async fn get(&self, id: &Uuid) -> Result<Option<T>>;

    /// List all entities
    async fn list(&self) -> Result<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, id: &Uuid, entity: T) -> Result<T>;
}

/// Order persistence with a compare-and-swap status write
///
/// Status transitions are validated against the persisted status, so the
/// write must fail if another operator moved the order in the meantime.
#[async_trait]
pub trait OrderStore: DataService<Order> {
    /// Find an order by its human-readable number
    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>>;

    /// All orders placed by a user, most recent first
    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<Order>>;

    /// Replace the stored order only if its status is still `expected`
    ///
    /// Fails with `OrderError::StatusConflict` otherwise, and with
    /// `OrderError::NotFound` if the order does not exist.
    async fn update_if_status(&self, order: Order, expected: OrderStatus) -> CateringResult<Order>;
}

/// Menu persistence with atomic stock reservation
#[async_trait]
pub trait MenuStore: DataService<Menu> {
    /// Check availability and decrement the stock in one atomic step
    ///
    /// Returns the menu as stored after the reservation. Unlimited menus are
    /// returned unchanged.
    async fn reserve_stock(&self, menu_id: &Uuid, persons: u32) -> CateringResult<Menu>;

    /// Give back places taken by a reservation that could not be completed
    async fn release_stock(&self, menu_id: &Uuid, persons: u32) -> CateringResult<Menu>;
}

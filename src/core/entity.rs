//! Entity trait defining the persisted shape shared by menus, customers and orders

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Base trait for every persisted type.
///
/// All entities have:
/// - id: Unique identifier
/// - created_at: Creation timestamp
/// - updated_at: Last modification timestamp
///
/// Entities are never physically deleted by the order engine, so there is no
/// soft-delete marker here.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The plural resource name (e.g., "orders", "menus")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "order", "menu")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Business key that must stay unique across a store, if any
    fn unique_key(&self) -> Option<&str> {
        None
    }

    /// Whether the entity was modified after creation
    fn is_modified(&self) -> bool {
        self.updated_at() > self.created_at()
    }
}

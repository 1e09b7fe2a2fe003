//! In-memory implementation of the persistence ports for testing and development
//!
//! Every read-check-write sequence (status compare-and-swap, stock
//! reservation) runs under a single write-lock guard, which gives the
//! atomicity a relational store would provide with row locking.

use crate::core::entity::Entity;
use crate::core::error::{CateringResult, OrderError, StorageError};
use crate::core::service::{DataService, MenuStore, OrderStore};
use crate::entities::{Menu, Order, OrderStatus};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

const BACKEND: &str = "in_memory";

/// In-memory data service for any entity type
///
/// Uses RwLock for thread-safe access. Clones share the same storage.
#[derive(Clone)]
pub struct InMemoryDataService<T> {
    entities: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Entity> InMemoryDataService<T> {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed the store with existing entities
    pub fn with_entities(entities: impl IntoIterator<Item = T>) -> Self {
        let map = entities.into_iter().map(|e| (e.id(), e)).collect();
        Self {
            entities: Arc::new(RwLock::new(map)),
        }
    }

    fn read_guard(&self) -> CateringResult<RwLockReadGuard<'_, HashMap<Uuid, T>>> {
        self.entities.read().map_err(|_| {
            StorageError::LockPoisoned {
                backend: BACKEND.to_string(),
                kind: "read".to_string(),
            }
            .into()
        })
    }

    fn write_guard(&self) -> CateringResult<RwLockWriteGuard<'_, HashMap<Uuid, T>>> {
        self.entities.write().map_err(|_| {
            StorageError::LockPoisoned {
                backend: BACKEND.to_string(),
                kind: "write".to_string(),
            }
            .into()
        })
    }
}

impl<T: Entity> Default for InMemoryDataService<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Store for orders
pub type InMemoryOrderStore = InMemoryDataService<Order>;

/// Store for menus
pub type InMemoryMenuStore = InMemoryDataService<Menu>;

#[async_trait]
impl<T: Entity> DataService<T> for InMemoryDataService<T> {
    async fn create(&self, entity: T) -> Result<T> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if entities.contains_key(&entity.id()) {
            return Err(already_exists::<T>(entity.id().to_string()));
        }
        ensure_key_free(&entities, &entity)?;
        entities.insert(entity.id(), entity.clone());

        Ok(entity)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<T>> {
        let entities = self
            .entities
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(entities.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>> {
        let entities = self
            .entities
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut all: Vec<T> = entities.values().cloned().collect();
        all.sort_by_key(|e| e.created_at());
        Ok(all)
    }

    async fn update(&self, id: &Uuid, entity: T) -> Result<T> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if !entities.contains_key(id) {
            return Err(OrderError::NotFound {
                entity_type: T::resource_name_singular().to_string(),
                id: *id,
            }
            .into());
        }
        ensure_key_free(&entities, &entity)?;
        entities.insert(*id, entity.clone());

        Ok(entity)
    }
}

fn already_exists<T: Entity>(key: String) -> anyhow::Error {
    OrderError::AlreadyExists {
        entity_type: T::resource_name_singular().to_string(),
        key,
    }
    .into()
}

/// Reject `entity` when another stored entity holds the same business key
fn ensure_key_free<T: Entity>(entities: &HashMap<Uuid, T>, entity: &T) -> Result<()> {
    let Some(key) = entity.unique_key() else {
        return Ok(());
    };
    if entities
        .values()
        .any(|other| other.id() != entity.id() && other.unique_key() == Some(key))
    {
        return Err(already_exists::<T>(key.to_string()));
    }
    Ok(())
}

#[async_trait]
impl OrderStore for InMemoryDataService<Order> {
    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        let orders = self.read_guard()?;
        Ok(orders
            .values()
            .find(|o| o.order_number() == order_number)
            .cloned())
    }

    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<Order>> {
        let orders = self.read_guard()?;
        let mut found: Vec<Order> = orders
            .values()
            .filter(|o| &o.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(found)
    }

    async fn update_if_status(&self, order: Order, expected: OrderStatus) -> CateringResult<Order> {
        let mut orders = self.write_guard()?;

        let stored = orders.get(&order.id()).ok_or_else(|| OrderError::NotFound {
            entity_type: Order::resource_name_singular().to_string(),
            id: order.id(),
        })?;

        if stored.status() != expected {
            return Err(OrderError::StatusConflict {
                order_number: stored.order_number().to_string(),
                expected,
                actual: stored.status(),
            }
            .into());
        }

        orders.insert(order.id(), order.clone());
        Ok(order)
    }
}

#[async_trait]
impl MenuStore for InMemoryDataService<Menu> {
    async fn reserve_stock(&self, menu_id: &Uuid, persons: u32) -> CateringResult<Menu> {
        let mut menus = self.write_guard()?;

        let menu = menus.get_mut(menu_id).ok_or_else(|| OrderError::NotFound {
            entity_type: Menu::resource_name_singular().to_string(),
            id: *menu_id,
        })?;

        menu.decrement_stock(persons)?;
        Ok(menu.clone())
    }

    async fn release_stock(&self, menu_id: &Uuid, persons: u32) -> CateringResult<Menu> {
        let mut menus = self.write_guard()?;

        let menu = menus.get_mut(menu_id).ok_or_else(|| OrderError::NotFound {
            entity_type: Menu::resource_name_singular().to_string(),
            id: *menu_id,
        })?;

        menu.increment_stock(persons);
        Ok(menu.clone())
    }
}

//! Customer-side entities: the ordering user and their delivery addresses

use crate::impl_entity;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

/// French postal codes: five digits
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("valid postal code regex"));

/// A registered customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub phone: Option<String>,
}

impl_entity!(User, "user", "users");

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A delivery address belonging to a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Address {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "street is required"))]
    pub street: String,
    #[validate(regex(path = *POSTAL_CODE, message = "postal code must have five digits"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    pub phone: Option<String>,
}

impl_entity!(Address, "address", "addresses");

impl Address {
    pub fn new(
        user_id: Uuid,
        street: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            user_id,
            street: street.into(),
            postal_code: postal_code.into(),
            city: city.into(),
            phone,
        }
    }

    /// Single-line form used in delivery snapshots and distance lookups
    pub fn formatted(&self) -> String {
        format!("{}, {} {}", self.street.trim(), self.postal_code.trim(), self.city.trim())
    }
}

//! Core module containing fundamental traits and types for the order engine

pub mod clock;
pub mod entity;
pub mod error;
pub mod events;
pub mod money;
pub mod query;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{CateringError, CateringResult, OrderError};
pub use events::{EventBus, EventEnvelope, OrderEvent};
pub use money::Money;
pub use query::{PaginatedResponse, PaginationMeta, QueryParams, SortDirection};
pub use service::{DataService, MenuStore, OrderStore};

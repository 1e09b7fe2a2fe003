//! Order lifecycle: validation, orchestration and read-side services

pub mod builder;
pub mod filter;
pub mod manager;
pub mod number;
pub mod statistics;
pub mod validator;

pub use builder::OrderManagerBuilder;
pub use filter::{OrderFilter, OrderFilterService};
pub use manager::{OrderManager, OrderRequest};
pub use number::generate_order_number;
pub use statistics::{MenuStatistics, OrderStatistics, OrderStatisticsService};
pub use validator::{LoanState, OrderStatusValidator, StatusCheck};

//! Human-readable order numbers: `PREFIX-YYYYMMDD-XXXXXXXX`

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Random part length, in hexadecimal characters
const SUFFIX_LEN: usize = 8;

/// Build a new order number for an order created at `now`
///
/// The suffix is the first eight hex digits of a random UUID, uppercased.
pub fn generate_order_number(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_uppercase();
    format!("{}-{}-{}", prefix, now.format("%Y%m%d"), suffix)
}

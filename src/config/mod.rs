//! Configuration loading and management
//!
//! Every business constant of the order engine (fees, local zone, lead time,
//! loan deadlines, opening hours) comes from here so that deployments and
//! tests can substitute their own values. Missing YAML sections fall back to
//! the defaults.

use crate::core::error::{CateringResult, ConfigError};
use crate::pricing::{DeliveryZone, PricingConfig};
use crate::schedule::OpeningSchedule;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("valid postal code regex"));

static ORDER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{1,10}$").expect("valid order prefix regex"));

const ORDER_NUMBER_PLACEHOLDER: &str = "{order_number}";

/// One year; longer lead times and loan deadlines overflow date arithmetic
const MAX_LEAD_TIME_HOURS: i64 = 24 * 365;
const MAX_LOAN_DEADLINE_DAYS: i64 = 365;

/// Material loan deadlines, in days after the delivery date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialLoanConfig {
    /// Expected return window, set when the order is created with a loan
    pub creation_deadline_days: i64,
    /// Hard deadline, set when an operator moves the order to material return
    pub return_deadline_days: i64,
}

impl Default for MaterialLoanConfig {
    fn default() -> Self {
        Self {
            creation_deadline_days: 10,
            return_deadline_days: 2,
        }
    }
}

/// Complete configuration of the order engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CateringConfig {
    pub pricing: PricingConfig,

    /// Postal codes delivered at the flat fee
    pub delivery_zone: DeliveryZone,

    /// Minimum gap between now and the requested delivery, strictly exceeded
    pub lead_time_hours: i64,

    pub material_loan: MaterialLoanConfig,

    /// Weekly opening hours
    pub schedule: OpeningSchedule,

    /// Upper bound on a distance lookup before falling back to the flat fee
    pub distance_timeout_ms: u64,

    /// Review invitation link sent on completion; `{order_number}` is substituted
    pub review_url_template: String,

    /// Leading part of generated order numbers
    pub order_number_prefix: String,

    /// Buffered events per subscriber on the event bus
    pub event_bus_capacity: usize,
}

impl Default for CateringConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            delivery_zone: DeliveryZone::default(),
            lead_time_hours: 48,
            material_loan: MaterialLoanConfig::default(),
            schedule: OpeningSchedule::default(),
            distance_timeout_ms: 5000,
            review_url_template: "https://vite-et-gourmand.fr/avis/{order_number}".to_string(),
            order_number_prefix: "CMD".to_string(),
            event_bus_capacity: 1024,
        }
    }
}

impl CateringConfig {
    /// Load configuration from a YAML file and validate it
    pub fn from_yaml_file(path: impl AsRef<Path>) -> CateringResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path.display(), e),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string and validate it
    pub fn from_yaml_str(yaml: &str) -> CateringResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration (Bordeaux zone, 48 h lead time)
    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn lead_time(&self) -> chrono::Duration {
        chrono::Duration::hours(self.lead_time_hours)
    }

    pub fn distance_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.distance_timeout_ms)
    }

    pub fn creation_return_deadline(&self) -> chrono::Duration {
        chrono::Duration::days(self.material_loan.creation_deadline_days)
    }

    pub fn material_return_deadline(&self) -> chrono::Duration {
        chrono::Duration::days(self.material_loan.return_deadline_days)
    }

    pub fn review_url(&self, order_number: &str) -> String {
        self.review_url_template
            .replace(ORDER_NUMBER_PLACEHOLDER, order_number)
    }

    /// Check the values serde cannot check
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("lead_time_hours", self.lead_time_hours, MAX_LEAD_TIME_HOURS)?;
        if self.pricing.base_delivery_fee.cents() < 0 {
            return Err(invalid(
                "pricing.base_delivery_fee",
                self.pricing.base_delivery_fee.cents(),
                "must not be negative",
            ));
        }
        if self.pricing.per_km_fee.cents() < 0 {
            return Err(invalid(
                "pricing.per_km_fee",
                self.pricing.per_km_fee.cents(),
                "must not be negative",
            ));
        }
        if self.pricing.discount_percent > 100 {
            return Err(invalid(
                "pricing.discount_percent",
                self.pricing.discount_percent,
                "must be between 0 and 100",
            ));
        }
        if let Some(code) = self
            .delivery_zone
            .postal_codes
            .iter()
            .find(|code| !POSTAL_CODE.is_match(code))
        {
            return Err(invalid("delivery_zone.postal_codes", code, "must have five digits"));
        }
        check_range(
            "material_loan.creation_deadline_days",
            self.material_loan.creation_deadline_days,
            MAX_LOAN_DEADLINE_DAYS,
        )?;
        check_range(
            "material_loan.return_deadline_days",
            self.material_loan.return_deadline_days,
            MAX_LOAN_DEADLINE_DAYS,
        )?;
        self.validate_schedule()?;
        if self.distance_timeout_ms == 0 {
            return Err(invalid("distance_timeout_ms", 0, "must be positive"));
        }
        if !self.review_url_template.contains(ORDER_NUMBER_PLACEHOLDER) {
            return Err(invalid(
                "review_url_template",
                &self.review_url_template,
                "must contain {order_number}",
            ));
        }
        if !ORDER_PREFIX.is_match(&self.order_number_prefix) {
            return Err(invalid(
                "order_number_prefix",
                &self.order_number_prefix,
                "must be 1 to 10 uppercase letters or digits",
            ));
        }
        if self.event_bus_capacity == 0 {
            return Err(invalid("event_bus_capacity", 0, "must be positive"));
        }
        Ok(())
    }

    fn validate_schedule(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for hours in &self.schedule.days {
            if !seen.insert(hours.day) {
                return Err(invalid("schedule.days", hours.day, "day listed twice"));
            }
            if !hours.closed && hours.open >= hours.close {
                return Err(invalid(
                    "schedule.days",
                    format!("{} {}-{}", hours.day, hours.open, hours.close),
                    "opening time must precede closing time",
                ));
            }
        }
        Ok(())
    }
}

fn check_range(field: &str, value: i64, max: i64) -> Result<(), ConfigError> {
    if value < 0 {
        return Err(invalid(field, value, "must not be negative"));
    }
    if value > max {
        return Err(invalid(field, value, &format!("must not exceed {max}")));
    }
    Ok(())
}

fn invalid(field: &str, value: impl ToString, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

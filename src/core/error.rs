//! Typed error handling for the catering order engine
//!
//! Domain failures are raised synchronously by the manager and the status
//! validator and are meant to be caught at the controller boundary, where
//! [`CateringError`] converts itself into an HTTP response carrying the
//! human-readable reason.
//!
//! # Error Categories
//!
//! - [`OrderError`]: Business-rule rejections (stock, delivery window, transitions)
//! - [`ValidationError`]: Malformed input
//! - [`ConfigError`]: Configuration parsing and validation
//! - [`StorageError`]: Persistence backend failures
//!
//! # Example
//!
//! ```rust,ignore
//! match manager.create_order(request).await {
//!     Ok(order) => println!("Quote: {}", order.total_price()),
//!     Err(CateringError::Order(OrderError::InsufficientStock { remaining, requested })) => {
//!         println!("Only {} places left ({} requested)", remaining, requested);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use crate::entities::OrderStatus;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The main error type for the order engine
#[derive(Debug, thiserror::Error)]
pub enum CateringError {
    /// Business-rule rejections
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CateringError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CateringError::Order(e) => e.status_code(),
            CateringError::Validation(_) => StatusCode::BAD_REQUEST,
            CateringError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CateringError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CateringError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CateringError::Order(e) => e.error_code(),
            CateringError::Validation(_) => "VALIDATION_ERROR",
            CateringError::Config(_) => "CONFIG_ERROR",
            CateringError::Storage(_) => "STORAGE_ERROR",
            CateringError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CateringError::Order(OrderError::InsufficientStock {
                remaining,
                requested,
            }) => Some(serde_json::json!({
                "remaining": remaining,
                "requested": requested
            })),
            CateringError::Order(OrderError::InvalidDeliveryWindow {
                requested,
                next_opening,
                ..
            }) => Some(serde_json::json!({
                "requested": requested,
                "next_opening": next_opening
            })),
            CateringError::Order(OrderError::InvalidTransition { from, to, .. }) => {
                Some(serde_json::json!({ "from": from, "to": to }))
            }
            CateringError::Order(OrderError::StatusConflict { expected, actual, .. }) => {
                Some(serde_json::json!({ "expected": expected, "actual": actual }))
            }
            CateringError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for CateringError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Order Errors
// =============================================================================

/// Business-rule rejections raised by the order engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    /// Menu stock is exhausted
    #[error("Menu '{menu_name}' is no longer available")]
    MenuUnavailable { menu_name: String },

    /// Requested persons exceed the remaining stock
    #[error("Insufficient stock: {remaining} places remain, {requested} requested")]
    InsufficientStock { remaining: u32, requested: u32 },

    /// Lead time or opening-hours violation
    #[error("Delivery not possible at {requested}: {reason}{}", next_opening_hint(.next_opening))]
    InvalidDeliveryWindow {
        requested: DateTime<Utc>,
        reason: String,
        next_opening: Option<DateTime<Utc>>,
    },

    /// Status change not allowed
    #[error("Cannot move order from {from} to {to}: {reason}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        reason: String,
    },

    /// Cancellation attempted on a terminal order
    #[error("Order {order_number} cannot be cancelled in status {status}")]
    NotCancellable {
        order_number: String,
        status: OrderStatus,
    },

    /// The persisted status moved since the caller read the order
    #[error("Order {order_number} was modified concurrently: expected {expected}, found {actual}")]
    StatusConflict {
        order_number: String,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// Referenced entity does not exist
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: String, id: Uuid },

    /// Another stored entity already uses this id or business key
    #[error("{entity_type} '{key}' already exists")]
    AlreadyExists { entity_type: String, key: String },
}

fn next_opening_hint(next_opening: &Option<DateTime<Utc>>) -> String {
    match next_opening {
        Some(at) => format!(" (next possible delivery: {})", at.format("%Y-%m-%d %H:%M UTC")),
        None => String::new(),
    }
}

impl OrderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderError::MenuUnavailable { .. } => StatusCode::CONFLICT,
            OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
            OrderError::InvalidDeliveryWindow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::NotCancellable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::StatusConflict { .. } => StatusCode::CONFLICT,
            OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::AlreadyExists { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OrderError::MenuUnavailable { .. } => "MENU_UNAVAILABLE",
            OrderError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            OrderError::InvalidDeliveryWindow { .. } => "INVALID_DELIVERY_WINDOW",
            OrderError::InvalidTransition { .. } => "INVALID_TRANSITION",
            OrderError::NotCancellable { .. } => "NOT_CANCELLABLE",
            OrderError::StatusConflict { .. } => "STATUS_CONFLICT",
            OrderError::NotFound { .. } => "NOT_FOUND",
            OrderError::AlreadyExists { .. } => "ALREADY_EXISTS",
        }
    }

    /// Reason carried by the rejection, as shown to the end user
    pub fn reason(&self) -> String {
        match self {
            OrderError::InvalidTransition { reason, .. } => reason.clone(),
            OrderError::InvalidDeliveryWindow { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Single field validation error
    #[error("Validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    #[error("Validation errors: {}", join_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument { argument: String },

    /// Invalid JSON format
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn join_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    #[error("IO error: {message}")]
    IoError { message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    match file {
        Some(file) => format!(" file '{}'", file),
        None => String::new(),
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Query execution error
    #[error("{backend} query error: {message}")]
    QueryError { backend: String, message: String },

    /// Lock could not be acquired
    #[error("Failed to acquire {kind} lock on {backend}")]
    LockPoisoned { backend: String, kind: String },

    /// Data integrity error
    #[error("Data integrity error: {message}")]
    IntegrityError { message: String },
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for CateringError {
    fn from(err: serde_json::Error) -> Self {
        CateringError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for CateringError {
    fn from(err: serde_yaml::Error) -> Self {
        CateringError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for CateringError {
    fn from(err: std::io::Error) -> Self {
        CateringError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for CateringError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        CateringError::Validation(ValidationError::FieldErrors(fields))
    }
}

/// Flatten nested validation errors into dotted field paths (`address.postal_code`)
fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldValidationError>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            validator::ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| FieldValidationError {
                    field: path.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                }));
            }
            validator::ValidationErrorsKind::Struct(inner) => {
                collect_field_errors(&path, inner, out);
            }
            validator::ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

/// Storage ports report failures through `anyhow`; keep typed errors when
/// they were wrapped, otherwise classify as a storage failure.
impl From<anyhow::Error> for CateringError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CateringError>() {
            Ok(catering) => catering,
            Err(err) => match err.downcast::<OrderError>() {
                Ok(order) => CateringError::Order(order),
                Err(err) => CateringError::Storage(StorageError::QueryError {
                    backend: "store".to_string(),
                    message: err.to_string(),
                }),
            },
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for order engine operations
pub type CateringResult<T> = Result<T, CateringError>;

// =============================================================================
// Tests
// =============================================================================

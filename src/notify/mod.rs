//! Customer notifications for order confirmation and status changes
//!
//! Delivery of the rendered message (SMTP or otherwise) is outside the order
//! engine. The manager calls an [`OrderNotifier`] after every committed
//! change and only logs its failures: a notification that could not be sent
//! never undoes an order state change.

use crate::core::error::{CateringError, CateringResult};
use crate::entities::{Order, OrderStatus};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tera::{Context, Tera};

/// Outbound notification port
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Sent once the order is persisted
    async fn send_order_confirmation(&self, order: &Order) -> Result<()>;

    /// Sent after every status change; `review_url` accompanies completion
    async fn send_status_change_notification(
        &self,
        order: &Order,
        status: OrderStatus,
        review_url: Option<&str>,
    ) -> Result<()>;
}

/// A rendered message ready for a transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

const CONFIRMATION_SUBJECT: &str = "confirmation.subject";
const CONFIRMATION_BODY: &str = "confirmation.body";
const STATUS_SUBJECT: &str = "status_change.subject";
const STATUS_BODY: &str = "status_change.body";

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        CONFIRMATION_SUBJECT,
        "Confirmation de votre commande {{ order_number }}",
    ),
    (
        CONFIRMATION_BODY,
        r#"Bonjour {{ customer_name }},

Nous avons bien reçu votre commande {{ order_number }} : {{ menu_name }} pour {{ persons }} personnes.
Livraison prévue le {{ delivery_datetime }} à l'adresse {{ delivery_address }}.

Sous-total : {{ subtotal }}
Livraison : {{ delivery_cost }}
{% if discount %}Remise : -{{ discount }}
{% endif %}Total : {{ total }}
{% if material_loan %}
Le matériel prêté devra être restitué avant le {{ material_return_deadline }}.
{% endif %}"#,
    ),
    (
        STATUS_SUBJECT,
        "Commande {{ order_number }} : {{ status_label }}",
    ),
    (
        STATUS_BODY,
        r#"Bonjour {{ customer_name }},

Votre commande {{ order_number }} est maintenant : {{ status_label }}.
{% if status == "waiting_material_return" and material_return_deadline %}
Merci de restituer le matériel prêté avant le {{ material_return_deadline }}.
{% endif %}{% if status == "cancelled" and cancellation_reason %}
Motif : {{ cancellation_reason }}
{% endif %}{% if review_url %}
Votre avis nous intéresse : {{ review_url }}
{% endif %}"#,
    ),
];

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Renders notification subjects and bodies with tera templates
#[derive(Debug, Clone)]
pub struct NotificationRenderer {
    tera: Tera,
}

impl NotificationRenderer {
    /// Renderer with the built-in French templates
    pub fn new() -> CateringResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(DEFAULT_TEMPLATES.iter().copied())
            .map_err(template_error)?;
        Ok(Self { tera })
    }

    /// Replace one of the built-in templates
    ///
    /// Names: `confirmation.subject`, `confirmation.body`,
    /// `status_change.subject`, `status_change.body`.
    pub fn with_template(mut self, name: &str, content: &str) -> CateringResult<Self> {
        self.tera
            .add_raw_template(name, content)
            .map_err(template_error)?;
        Ok(self)
    }

    pub fn confirmation(&self, order: &Order) -> CateringResult<Notification> {
        let context = order_context(order);
        self.render(order, CONFIRMATION_SUBJECT, CONFIRMATION_BODY, &context)
    }

    pub fn status_change(
        &self,
        order: &Order,
        status: OrderStatus,
        review_url: Option<&str>,
    ) -> CateringResult<Notification> {
        let mut context = order_context(order);
        context.insert("status", status.as_str());
        context.insert("status_label", status.label());
        context.insert("review_url", &review_url);
        self.render(order, STATUS_SUBJECT, STATUS_BODY, &context)
    }

    fn render(
        &self,
        order: &Order,
        subject: &str,
        body: &str,
        context: &Context,
    ) -> CateringResult<Notification> {
        Ok(Notification {
            to: order.customer_email().to_string(),
            subject: self.tera.render(subject, context).map_err(template_error)?,
            body: self.tera.render(body, context).map_err(template_error)?,
        })
    }
}

fn order_context(order: &Order) -> Context {
    let mut context = Context::new();
    context.insert("order_number", order.order_number());
    context.insert("customer_name", &order.customer_full_name());
    context.insert("menu_name", order.menu_name());
    context.insert("persons", &order.number_of_persons());
    context.insert(
        "delivery_datetime",
        &order.delivery_datetime().format(DATE_FORMAT).to_string(),
    );
    context.insert("delivery_address", order.delivery_address());
    context.insert("subtotal", &order.subtotal().to_string());
    context.insert("delivery_cost", &order.delivery_cost().to_string());
    context.insert("discount", &order.discount_amount().map(|d| d.to_string()));
    context.insert("total", &order.total_price().to_string());
    context.insert("material_loan", &order.has_material_loan());
    context.insert(
        "material_return_deadline",
        &order
            .material_return_deadline()
            .map(|d| d.format(DATE_FORMAT).to_string()),
    );
    context.insert("cancellation_reason", &order.cancellation_reason());
    context
}

fn template_error(err: tera::Error) -> CateringError {
    CateringError::Internal(format!("notification template error: {err}"))
}

/// Renders notifications and writes them to the log
///
/// Stands in for a mail transport in development setups.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    renderer: NotificationRenderer,
}

impl LogNotifier {
    pub fn new(renderer: NotificationRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn send_order_confirmation(&self, order: &Order) -> Result<()> {
        let message = self.renderer.confirmation(order)?;
        tracing::info!(
            order_number = order.order_number(),
            to = %message.to,
            subject = %message.subject,
            "Order confirmation sent"
        );
        tracing::debug!(body = %message.body);
        Ok(())
    }

    async fn send_status_change_notification(
        &self,
        order: &Order,
        status: OrderStatus,
        review_url: Option<&str>,
    ) -> Result<()> {
        let message = self.renderer.status_change(order, status, review_url)?;
        tracing::info!(
            order_number = order.order_number(),
            to = %message.to,
            status = %status,
            subject = %message.subject,
            "Status change notification sent"
        );
        tracing::debug!(body = %message.body);
        Ok(())
    }
}

/// A notification captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq)]
pub enum SentNotification {
    Confirmation {
        order_number: String,
    },
    StatusChange {
        order_number: String,
        status: OrderStatus,
        review_url: Option<String>,
    },
}

/// Keeps every notification in memory
///
/// A failing recorder still records the attempt, then returns an error.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose every send fails
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn record(&self, notification: SentNotification) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
        if self.failing {
            return Err(anyhow!("mail transport unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn send_order_confirmation(&self, order: &Order) -> Result<()> {
        self.record(SentNotification::Confirmation {
            order_number: order.order_number().to_string(),
        })
    }

    async fn send_status_change_notification(
        &self,
        order: &Order,
        status: OrderStatus,
        review_url: Option<&str>,
    ) -> Result<()> {
        self.record(SentNotification::StatusChange {
            order_number: order.order_number().to_string(),
            status,
            review_url: review_url.map(str::to_string),
        })
    }
}

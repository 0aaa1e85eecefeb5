//! Outbound email collaborator.
//!
//! The core only knows *which* template to send, to whom, and with which
//! variables; rendering and delivery belong to the provider.

mod transactional;

pub use transactional::TransactionalApiSender;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::email::EmailConfig;
use crate::models::{appointment, center};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    BookingConfirmation,
    Reminder3h,
    Cancellation,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailTemplate::BookingConfirmation => "booking_confirmation",
            EmailTemplate::Reminder3h => "reminder_3h",
            EmailTemplate::Cancellation => "cancellation",
        }
    }
}

impl std::fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of sending an email
#[derive(Debug, Clone)]
pub struct SendResult {
    pub success: bool,
    pub error: Option<String>,
}

impl SendResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Abstract send contract the booking engine and reminder dispatcher depend on
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient: &str,
        variables: &serde_json::Value,
    ) -> SendResult;
}

pub type SharedEmailSender = Arc<dyn EmailSender>;

/// Used when no provider is configured. Fails every send so nothing is
/// recorded as delivered.
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient: &str,
        _variables: &serde_json::Value,
    ) -> SendResult {
        tracing::debug!(
            template = template.as_str(),
            recipient = %mask_recipient(recipient),
            "Email delivery disabled, dropping message"
        );
        SendResult::failed("Email delivery not configured")
    }
}

/// Build the sender described by the configuration
pub fn sender_from_config(config: &EmailConfig) -> SharedEmailSender {
    match TransactionalApiSender::from_config(config) {
        Some(sender) => {
            tracing::info!(api_url = %config.api_url, "Transactional email provider initialized");
            Arc::new(sender)
        }
        None => {
            tracing::warn!("No email API key configured - email delivery disabled");
            Arc::new(DisabledEmailSender)
        }
    }
}

/// Template variables shared by every appointment email
pub fn appointment_variables(
    appointment: &appointment::Model,
    center: Option<&center::Model>,
    public_url: &str,
) -> serde_json::Value {
    serde_json::json!({
        "firstName": appointment.first_name,
        "lastName": appointment.last_name,
        "date": appointment.appointment_date.format("%d/%m/%Y").to_string(),
        "time": appointment.appointment_time.format("%H:%M").to_string(),
        "centerName": center.map(|c| c.name.as_str()).unwrap_or_default(),
        "centerAddress": center.map(|c| c.address.as_str()).unwrap_or_default(),
        "centerCity": center.map(|c| c.city.as_str()).unwrap_or_default(),
        "cancelUrl": format!(
            "{}/appointments/{}/cancel?token={}",
            public_url, appointment.id, appointment.cancel_token
        ),
    })
}

/// Mask a recipient for logging (privacy)
pub fn mask_recipient(recipient: &str) -> String {
    match recipient.split_once('@') {
        Some((local, domain)) if local.chars().count() > 2 => {
            let head: String = local.chars().take(2).collect();
            format!("{}***@{}", head, domain)
        }
        _ => "***@***".to_string(),
    }
}

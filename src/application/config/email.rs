use std::env;
use std::time::Duration;

use super::env_u64;

/// Transactional email API settings. Templates live with the provider; only their ids are known here.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    /// When unset, email delivery is disabled and every send fails
    pub api_key: Option<String>,
    pub sender_address: String,
    pub sender_name: String,
    pub send_timeout: Duration,
    pub template_confirmation: Option<i64>,
    pub template_reminder: Option<i64>,
    pub template_cancellation: Option<i64>,
    /// Public site URL used to build cancel links in emails
    pub public_url: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("CENTERBOOK_EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".to_string()),
            api_key: env::var("CENTERBOOK_EMAIL_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            sender_address: env::var("CENTERBOOK_EMAIL_SENDER")
                .unwrap_or_else(|_| "no-reply@centerbook.local".to_string()),
            sender_name: env::var("CENTERBOOK_EMAIL_SENDER_NAME")
                .unwrap_or_else(|_| "Centerbook".to_string()),
            send_timeout: Duration::from_secs(env_u64("CENTERBOOK_EMAIL_TIMEOUT_SECS", 10)),
            template_confirmation: template_id("CENTERBOOK_EMAIL_TEMPLATE_CONFIRMATION"),
            template_reminder: template_id("CENTERBOOK_EMAIL_TEMPLATE_REMINDER"),
            template_cancellation: template_id("CENTERBOOK_EMAIL_TEMPLATE_CANCELLATION"),
            public_url: env::var("CENTERBOOK_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

fn template_id(key: &str) -> Option<i64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

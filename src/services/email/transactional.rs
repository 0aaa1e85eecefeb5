use async_trait::async_trait;
use serde::Serialize;

use super::{mask_recipient, EmailSender, EmailTemplate, SendResult};
use crate::config::email::EmailConfig;

/// Template-based transactional email API (Brevo-style `POST /smtp/email`)
pub struct TransactionalApiSender {
    api_url: String,
    api_key: String,
    sender_address: String,
    sender_name: String,
    template_confirmation: Option<i64>,
    template_reminder: Option<i64>,
    template_cancellation: Option<i64>,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailPayload<'a> {
    sender: Mailbox<'a>,
    to: [Mailbox<'a>; 1],
    template_id: i64,
    params: &'a serde_json::Value,
    tags: [&'a str; 1],
}

#[derive(Serialize)]
struct Mailbox<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl TransactionalApiSender {
    /// Returns `None` when no API key is configured
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;

        let client = reqwest::Client::builder()
            .timeout(config.send_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client for email: {}", e);
                reqwest::Client::new()
            });

        Some(Self {
            api_url: config.api_url.clone(),
            api_key,
            sender_address: config.sender_address.clone(),
            sender_name: config.sender_name.clone(),
            template_confirmation: config.template_confirmation,
            template_reminder: config.template_reminder,
            template_cancellation: config.template_cancellation,
            client,
        })
    }

    fn template_id(&self, template: EmailTemplate) -> Option<i64> {
        match template {
            EmailTemplate::BookingConfirmation => self.template_confirmation,
            EmailTemplate::Reminder3h => self.template_reminder,
            EmailTemplate::Cancellation => self.template_cancellation,
        }
    }
}

#[async_trait]
impl EmailSender for TransactionalApiSender {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient: &str,
        variables: &serde_json::Value,
    ) -> SendResult {
        let template_id = match self.template_id(template) {
            Some(id) => id,
            None => {
                return SendResult::failed(format!("No template id configured for {}", template))
            }
        };

        let payload = SendEmailPayload {
            sender: Mailbox {
                email: &self.sender_address,
                name: Some(&self.sender_name),
            },
            to: [Mailbox {
                email: recipient,
                name: None,
            }],
            template_id,
            params: variables,
            tags: [template.as_str()],
        };

        match self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => {
                if response.status().is_success() {
                    tracing::debug!(
                        template = template.as_str(),
                        recipient = %mask_recipient(recipient),
                        "Email accepted by provider"
                    );
                    SendResult::ok()
                } else {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    SendResult::failed(format!("Email API error ({}): {}", status, error_text))
                }
            }
            Err(e) => SendResult::failed(format!("Failed to send email: {}", e)),
        }
    }
}

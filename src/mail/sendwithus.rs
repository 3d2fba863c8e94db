use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::MailError;
use crate::mail::{Sender, TemplatedEmail};

/// Templated-email provider client (sendwithus-compatible `send` endpoint)
#[derive(Clone)]
pub struct SendWithUsClient {
    client: Client,
    api_url: String,
    api_key: String,
    sender_address: String,
    sender_name: String,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    address: &'a str,
}

#[derive(Debug, Serialize)]
struct SenderInfo<'a> {
    address: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    email_id: &'a str,
    recipient: Recipient<'a>,
    email_data: &'a Value,
    sender: SenderInfo<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_name: Option<&'a str>,
}

impl SendWithUsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            sender_address: config.email_sender.clone(),
            sender_name: config.email_sender_name.clone(),
        }
    }

    /// Default sender identity merged with the message's override.
    fn payload<'a>(&'a self, email: &'a TemplatedEmail) -> Payload<'a> {
        let sender_override = email.sender.as_ref();

        Payload {
            email_id: &email.template_id,
            recipient: Recipient {
                address: &email.recipient,
            },
            email_data: &email.data,
            sender: SenderInfo {
                address: &self.sender_address,
                name: sender_override
                    .and_then(|s| s.name.as_deref())
                    .unwrap_or(&self.sender_name),
                reply_to: sender_override.and_then(|s| s.reply_to.as_deref()),
            },
            version_name: email.version_name.as_deref(),
        }
    }
}

#[async_trait]
impl Sender for SendWithUsClient {
    async fn send(&self, email: TemplatedEmail) -> Result<(), MailError> {
        let res = self
            .client
            .post(&self.api_url)
            .basic_auth(&self.api_key, None::<&str>)
            .json(&self.payload(&email))
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = match res.text().await.unwrap_or_default() {
                body if body.trim().is_empty() => format!("mail provider responded {}", status),
                body => body,
            };
            tracing::warn!(
                template = %email.template_id,
                status = status.as_u16(),
                "Mail provider rejected message"
            );
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(template = %email.template_id, "Mail accepted by provider");
        Ok(())
    }
}

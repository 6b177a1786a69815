//! Outbound email delivery through the MailerSend REST API.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const SEND_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("MailerSend request failed: {0}")]
    Connection(String),

    #[error("MailerSend send failed: {status} {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from_email: String,
    pub from_name: String,
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

pub struct MailerSendClient {
    api_key: SecretString,
    base_url: String,
    client: Client,
}

impl MailerSendClient {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| MailError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/email", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl MailSender for MailerSendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let payload = MailerSendPayload::from(email);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(status = status.as_u16(), "Email accepted by MailerSend");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MailerSendPayload<'a> {
    from: Mailbox<'a>,
    to: Vec<Mailbox<'a>>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Mailbox<'a> {
    email: &'a str,
    name: &'a str,
}

impl<'a> From<&'a OutgoingEmail> for MailerSendPayload<'a> {
    fn from(email: &'a OutgoingEmail) -> Self {
        Self {
            from: Mailbox {
                email: &email.from_email,
                name: &email.from_name,
            },
            to: vec![Mailbox {
                email: &email.to_email,
                name: email.to_name.as_deref().unwrap_or(&email.to_email),
            }],
            subject: &email.subject,
            text: email.body_text.as_deref(),
            html: email.body_html.as_deref(),
        }
    }
}

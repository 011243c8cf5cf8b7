//! Notification sinks: outbound delivery of rendered reports.
//!
//! The core only produces a [`RenderedReport`](super::RenderedReport);
//! delivery goes through the `Notifier` seam so sinks stay swappable.

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::errors::AppError;

use super::RenderedReport;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const DELIVERY_TIMEOUT_SECS: u64 = 20;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn notify(&self, report: &RenderedReport) -> Result<(), AppError>;
}

fn delivery_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(DELIVERY_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

/// Slack incoming-webhook sink; posts the report's text body.
pub struct SlackWebhookSink {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhookSink {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: delivery_client(),
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for SlackWebhookSink {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn notify(&self, report: &RenderedReport) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "text": report.text_body }))
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("Slack webhook call failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification(format!(
                "Slack webhook returned status {status}"
            )));
        }
        Ok(())
    }
}

/// SendGrid email sink; sends the report's HTML body.
pub struct SendGridEmailSink {
    client: reqwest::Client,
    api_key: String,
    from: String,
    to: String,
}

impl SendGridEmailSink {
    pub fn new(api_key: String, from: String, to: String) -> Self {
        Self {
            client: delivery_client(),
            api_key,
            from,
            to,
        }
    }
}

#[async_trait]
impl Notifier for SendGridEmailSink {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn notify(&self, report: &RenderedReport) -> Result<(), AppError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": report.subject,
            "content": [{ "type": "text/html", "value": report.html_body }]
        });

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("SendGrid call failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Notification(format!(
                "SendGrid returned status {status}: {detail}"
            )));
        }
        Ok(())
    }
}

/// All sinks the deployment has configured. May be empty.
pub fn build_sinks(config: &Config) -> Vec<Box<dyn Notifier>> {
    let mut sinks: Vec<Box<dyn Notifier>> = Vec::new();
    if let Some(sink) = slack_sink(config) {
        sinks.push(sink);
    }
    if let (Some(api_key), Some(recipient)) =
        (&config.sendgrid_api_key, &config.recipient_email)
    {
        sinks.push(Box::new(SendGridEmailSink::new(
            api_key.clone(),
            config.sender_email.clone(),
            recipient.clone(),
        )));
    }
    sinks
}

/// The Slack sink alone, used for critical-issue alerts.
pub fn slack_sink(config: &Config) -> Option<Box<dyn Notifier>> {
    config
        .slack_webhook_url
        .as_ref()
        .map(|url| Box::new(SlackWebhookSink::new(url.clone())) as Box<dyn Notifier>)
}

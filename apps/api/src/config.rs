use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Slack incoming-webhook URL. Absent means Slack delivery is disabled.
    pub slack_webhook_url: Option<String>,
    /// SendGrid API key. Absent means email delivery is disabled.
    pub sendgrid_api_key: Option<String>,
    pub sender_email: String,
    pub recipient_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:feedback.db?mode=rwc".to_string()),
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            slack_webhook_url: optional_env("SLACK_WEBHOOK_URL"),
            sendgrid_api_key: optional_env("SENDGRID_API_KEY"),
            sender_email: std::env::var("SENDER_EMAIL")
                .unwrap_or_else(|_| "noreply@yourdomain.com".to_string()),
            recipient_email: optional_env("RECIPIENT_EMAIL"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

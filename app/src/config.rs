// chat_orders/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,

  pub payment_webhook_secret: String,
  pub webhook_tolerance_secs: i64,
  pub currency: String,
  /// Absent means checkout sessions come from the in-process mock processor.
  pub stripe_secret_key: Option<String>,
  pub stripe_api_base: String,

  pub email_sender: String,
  pub notify_max_attempts: u32,

  pub seed_db: bool,
  pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("app_base_url", &self.app_base_url)
      .field("payment_webhook_secret", &"[REDACTED]")
      .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
      .field("currency", &self.currency)
      .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "[REDACTED]"))
      .field("stripe_api_base", &self.stripe_api_base)
      .field("email_sender", &self.email_sender)
      .field("notify_max_attempts", &self.notify_max_attempts)
      .field("seed_db", &self.seed_db)
      .field("log_format", &self.log_format)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from an arbitrary variable source; `from_env` passes the process
  /// environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL")
      .unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port))
      .trim_end_matches('/')
      .to_string();

    let payment_webhook_secret = get_env("PAYMENT_WEBHOOK_SECRET")?;
    let webhook_tolerance_secs = get_env("WEBHOOK_TOLERANCE_SECS")
      .unwrap_or_else(|_| "300".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid WEBHOOK_TOLERANCE_SECS: {}", e)))?;
    if webhook_tolerance_secs <= 0 {
      return Err(AppError::Config("WEBHOOK_TOLERANCE_SECS must be positive".to_string()));
    }
    let currency = get_env("CURRENCY").unwrap_or_else(|_| "usd".to_string()).to_lowercase();
    let stripe_secret_key = get_env("STRIPE_SECRET_KEY").ok();
    let stripe_api_base = get_env("STRIPE_API_BASE")
      .unwrap_or_else(|_| "https://api.stripe.com".to_string())
      .trim_end_matches('/')
      .to_string();

    let email_sender = get_env("EMAIL_SENDER").unwrap_or_else(|_| "noreply@example.com".to_string());
    let notify_max_attempts = get_env("NOTIFY_MAX_ATTEMPTS")
      .unwrap_or_else(|_| "3".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid NOTIFY_MAX_ATTEMPTS: {}", e)))?
      .max(1);

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;
    let log_format = match get_env("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()).as_str() {
      "text" => LogFormat::Text,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected text or json", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      payment_webhook_secret,
      webhook_tolerance_secs,
      currency,
      stripe_secret_key,
      stripe_api_base,
      email_sender,
      notify_max_attempts,
      seed_db,
      log_format,
    })
  }
}

// chat_orders/src/services/payment.rs

//! Hosted checkout sessions. `StripeCheckoutClient` talks to the Checkout Sessions API;
//! `MockPaymentProcessor` stands in when no secret key is configured and in tests.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
  pub name: String,
  pub description: Option<String>,
  pub unit_amount_cents: i64,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
  pub order_id: Uuid,
  pub conversation_id: Uuid,
  pub user_id: Uuid,
  pub currency: String,
  pub line_items: Vec<CheckoutLineItem>,
  pub customer_email: Option<String>,
  pub success_url: String,
  pub cancel_url: String,
}

impl CheckoutSessionRequest {
  pub fn total_cents(&self) -> i64 {
    self
      .line_items
      .iter()
      .map(|l| l.unit_amount_cents * i64::from(l.quantity))
      .sum()
  }

  /// Metadata echoed back on webhook events; `orderId` is what reconciliation keys on.
  pub fn metadata(&self) -> [(&'static str, String); 3] {
    [
      ("orderId", self.order_id.to_string()),
      ("chatId", self.conversation_id.to_string()),
      ("userId", self.user_id.to_string()),
    ]
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
  pub id: String,
  pub url: Option<String>,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession>;
}

pub struct StripeCheckoutClient {
  http: reqwest::Client,
  api_base: String,
  secret_key: String,
}

impl StripeCheckoutClient {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build payment HTTP client: {}", e)))?;
    Ok(Self {
      http,
      api_base: api_base.into(),
      secret_key: secret_key.into(),
    })
  }

  fn form_fields(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut fields = vec![
      ("mode".to_string(), "payment".to_string()),
      ("payment_method_types[0]".to_string(), "card".to_string()),
      ("success_url".to_string(), request.success_url.clone()),
      ("cancel_url".to_string(), request.cancel_url.clone()),
    ];
    for (i, item) in request.line_items.iter().enumerate() {
      let prefix = format!("line_items[{}]", i);
      fields.push((format!("{}[price_data][currency]", prefix), request.currency.clone()));
      fields.push((format!("{}[price_data][product_data][name]", prefix), item.name.clone()));
      if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
        fields.push((format!("{}[price_data][product_data][description]", prefix), description.to_string()));
      }
      fields.push((format!("{}[price_data][unit_amount]", prefix), item.unit_amount_cents.to_string()));
      fields.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
    }
    // Session metadata is not copied onto the PaymentIntent; failure events only see the latter.
    for (key, value) in request.metadata() {
      fields.push((format!("metadata[{}]", key), value.clone()));
      fields.push((format!("payment_intent_data[metadata][{}]", key), value));
    }
    if let Some(email) = &request.customer_email {
      fields.push(("customer_email".to_string(), email.clone()));
    }
    fields
  }
}

#[async_trait]
impl PaymentProcessor for StripeCheckoutClient {
  #[instrument(name = "stripe::create_checkout_session", skip(self, request), fields(order_id = %request.order_id, total_cents = request.total_cents()))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    let response = self
      .http
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .bearer_auth(&self.secret_key)
      .form(&Self::form_fields(request))
      .send()
      .await
      .map_err(|e| {
        error!(error = %e, "Payment processor request failed.");
        AppError::ExternalService("Failed to create checkout session".to_string())
      })?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      error!(%status, body = %body, "Payment processor rejected checkout session.");
      return Err(AppError::ExternalService("Failed to create checkout session".to_string()));
    }

    let session = response.json::<CheckoutSession>().await.map_err(|e| {
      error!(error = %e, "Payment processor returned an unreadable session.");
      AppError::ExternalService("Failed to create checkout session".to_string())
    })?;
    info!(session_id = %session.id, "Checkout session created.");
    Ok(session)
  }
}

/// In-process processor with simulated latency. Records every request it receives.
#[derive(Default)]
pub struct MockPaymentProcessor {
  requests: Mutex<Vec<CheckoutSessionRequest>>,
  failing: AtomicBool,
  latency_ms: u64,
}

impl MockPaymentProcessor {
  pub fn new() -> Self {
    Self {
      latency_ms: 50,
      ..Default::default()
    }
  }

  /// No simulated latency, for tests.
  pub fn instant() -> Self {
    Self::default()
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub async fn requests(&self) -> Vec<CheckoutSessionRequest> {
    self.requests.lock().await.clone()
  }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
  #[instrument(name = "mock_payments::create_checkout_session", skip(self, request), fields(order_id = %request.order_id, total_cents = request.total_cents()))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
    if self.latency_ms > 0 {
      tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
    }
    if self.failing.load(Ordering::SeqCst) {
      error!("Simulated payment processor outage.");
      return Err(AppError::ExternalService("Failed to create checkout session".to_string()));
    }
    self.requests.lock().await.push(request.clone());

    let id = format!("cs_mock_{}", Uuid::new_v4().simple());
    info!(session_id = %id, "Mock checkout session created.");
    Ok(CheckoutSession {
      url: Some(format!("{}#{}", request.success_url, id)),
      id,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request() -> CheckoutSessionRequest {
    CheckoutSessionRequest {
      order_id: Uuid::nil(),
      conversation_id: Uuid::nil(),
      user_id: Uuid::nil(),
      currency: "usd".to_string(),
      line_items: vec![
        CheckoutLineItem {
          name: "Egg Sandwich".to_string(),
          description: Some("Fried egg on brioche".to_string()),
          unit_amount_cents: 950,
          quantity: 2,
        },
        CheckoutLineItem {
          name: "Cookie".to_string(),
          description: None,
          unit_amount_cents: 350,
          quantity: 1,
        },
      ],
      customer_email: Some("ada@example.com".to_string()),
      success_url: "http://localhost/chat/x?success=true".to_string(),
      cancel_url: "http://localhost/chat/x?canceled=true".to_string(),
    }
  }

  #[test]
  fn total_sums_lines() {
    assert_eq!(request().total_cents(), 2250);
  }

  #[test]
  fn stripe_form_has_one_price_per_line_and_metadata() {
    let fields = StripeCheckoutClient::form_fields(&request());
    let get = |k: &str| fields.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
    assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("950"));
    assert_eq!(get("line_items[0][quantity]"), Some("2"));
    assert_eq!(get("line_items[1][price_data][product_data][name]"), Some("Cookie"));
    assert_eq!(get("line_items[0][price_data][product_data][description]"), Some("Fried egg on brioche"));
    assert_eq!(get("line_items[1][price_data][product_data][description]"), None);
    let order_id = Uuid::nil().to_string();
    for key in ["metadata[orderId]", "payment_intent_data[metadata][orderId]"] {
      assert_eq!(get(key), Some(order_id.as_str()), "{}", key);
    }
    for key in ["chatId", "userId"] {
      assert!(get(&format!("payment_intent_data[metadata][{}]", key)).is_some(), "{}", key);
    }
    assert_eq!(get("customer_email"), Some("ada@example.com"));
    assert_eq!(get("mode"), Some("payment"));
  }

  #[tokio::test]
  async fn mock_records_requests_and_can_fail() {
    let mock = MockPaymentProcessor::instant();
    let session = mock.create_checkout_session(&request()).await.unwrap();
    assert!(session.id.starts_with("cs_mock_"));
    assert_eq!(mock.requests().await.len(), 1);

    mock.set_failing(true);
    let err = mock.create_checkout_session(&request()).await.unwrap_err();
    assert!(matches!(err, AppError::ExternalService(m) if m == "Failed to create checkout session"));
    assert_eq!(mock.requests().await.len(), 1);
  }
}

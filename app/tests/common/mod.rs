// tests/common/mod.rs
#![allow(dead_code)]

use chat_orders::config::AppConfig;
use chat_orders::models::OrderStatus;
use chat_orders::services::notifier::{MockEmailNotifier, SentEmail};
use chat_orders::services::payment::MockPaymentProcessor;
use chat_orders::services::signature;
use chat_orders::state::AppState;
use chat_orders::store::{InMemoryCatalog, InMemoryOrderStore, OrderStore};
use chat_orders::tools::ToolContext;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_integration_secret";

/// Application state over in-memory adapters, with typed handles on each mock.
pub struct TestApp {
  pub state: AppState,
  pub store: Arc<InMemoryOrderStore>,
  pub catalog: Arc<InMemoryCatalog>,
  pub payments: Arc<MockPaymentProcessor>,
  pub notifier: Arc<MockEmailNotifier>,
}

pub fn test_config() -> AppConfig {
  let vars: HashMap<&str, &str> = HashMap::from([
    ("DATABASE_URL", "postgres://unused/test"),
    ("PAYMENT_WEBHOOK_SECRET", WEBHOOK_SECRET),
    ("APP_BASE_URL", "http://chat.test"),
    ("NOTIFY_MAX_ATTEMPTS", "3"),
  ]);
  AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).expect("test config")
}

pub fn build() -> TestApp {
  setup_tracing();
  let store = Arc::new(InMemoryOrderStore::new());
  let catalog = Arc::new(InMemoryCatalog::with_demo_menu());
  let payments = Arc::new(MockPaymentProcessor::instant());
  let notifier = Arc::new(MockEmailNotifier::instant("orders@chat.test"));
  let state = AppState::new(
    store.clone(),
    catalog.clone(),
    payments.clone(),
    notifier.clone(),
    Arc::new(test_config()),
  );
  TestApp {
    state,
    store,
    catalog,
    payments,
    notifier,
  }
}

pub fn tool_ctx(conversation_id: Uuid, user_id: Uuid) -> ToolContext {
  ToolContext::new(Some(conversation_id), Some(user_id)).expect("tool context")
}

pub fn payment_event(event_type: &str, order_id: Option<Uuid>) -> Value {
  let metadata = match order_id {
    Some(id) => json!({ "orderId": id.to_string() }),
    None => json!({}),
  };
  json!({
    "id": format!("evt_{}", Uuid::new_v4().simple()),
    "type": event_type,
    "data": { "object": { "metadata": metadata } }
  })
}

/// Serialized event plus a valid `stripe-signature` header for it.
pub fn signed(event: &Value) -> (Vec<u8>, String) {
  let body = serde_json::to_vec(event).expect("event json");
  let header = signature::sign(&body, WEBHOOK_SECRET, chrono::Utc::now().timestamp()).expect("sign");
  (body, header)
}

pub async fn order_status(app: &TestApp, order_id: Uuid) -> OrderStatus {
  app.store.find_order(order_id).await.unwrap().expect("order exists").status
}

/// Waits for detached confirmation sends to land.
pub async fn wait_for_emails(notifier: &MockEmailNotifier, expected: usize) -> Vec<SentEmail> {
  for _ in 0..100 {
    let sent = notifier.sent().await;
    if sent.len() >= expected {
      return sent;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  notifier.sent().await
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

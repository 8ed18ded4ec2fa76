// chat_orders/src/services/notifier.rs

//! Order confirmation e-mails. Delivery runs on its own task after the status write has
//! committed; its failures are logged and never reach the request that triggered it.

use crate::errors::{AppError, Result};
use crate::models::{format_cents, Modifications, OrderWithLines};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationItem {
  pub name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub modifications: Option<Modifications>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
  pub order_id: Uuid,
  pub recipient_email: String,
  pub customer_name: String,
  pub total_cents: i64,
  pub items: Vec<ConfirmationItem>,
}

impl OrderConfirmation {
  /// `customer_name` falls back to the part of the address before `@`.
  pub fn from_order(order: &OrderWithLines, recipient_email: &str, full_name: Option<&str>) -> Self {
    let customer_name = full_name
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| recipient_email.split('@').next().unwrap_or_default().to_string());
    Self {
      order_id: order.order.id,
      recipient_email: recipient_email.to_string(),
      customer_name,
      total_cents: order.total_cents(),
      items: order
        .lines
        .iter()
        .map(|l| ConfirmationItem {
          name: l.product_name.clone(),
          quantity: l.line.quantity,
          unit_price_cents: l.line.unit_price_cents,
          modifications: l.line.modifications.as_ref().map(|m| m.0.clone()),
        })
        .collect(),
    }
  }

  pub fn subject(&self) -> String {
    format!("Order Confirmation #{}", self.order_id)
  }

  pub fn render_text(&self) -> String {
    let mut body = format!("Hi {},\n\nThanks for your order! Here is what we received:\n\n", self.customer_name);
    for item in &self.items {
      body.push_str(&format!(
        "- {} x{} @ ${}",
        item.name,
        item.quantity,
        format_cents(item.unit_price_cents)
      ));
      if let Some(mods) = item.modifications.as_ref().filter(|m| !m.is_empty()) {
        let rendered: Vec<String> = mods.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        body.push_str(&format!(" ({})", rendered.join(", ")));
      }
      body.push('\n');
    }
    body.push_str(&format!("\nTotal: ${}\n", format_cents(self.total_cents)));
    body
  }
}

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send_order_confirmation(&self, confirmation: &OrderConfirmation) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SentEmail {
  pub to: String,
  pub from: String,
  pub subject: String,
  pub body: String,
  pub message_id: String,
}

/// Logs the rendered e-mail instead of delivering it. `fail_next(n)` makes the next `n`
/// sends fail, for exercising retries.
#[derive(Default)]
pub struct MockEmailNotifier {
  sender: String,
  latency_ms: u64,
  pending_failures: AtomicU32,
  sent: Mutex<Vec<SentEmail>>,
}

impl MockEmailNotifier {
  pub fn new(sender: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      latency_ms: 20,
      ..Default::default()
    }
  }

  pub fn instant(sender: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      ..Default::default()
    }
  }

  pub fn fail_next(&self, count: u32) {
    self.pending_failures.store(count, Ordering::SeqCst);
  }

  pub async fn sent(&self) -> Vec<SentEmail> {
    self.sent.lock().await.clone()
  }
}

#[async_trait]
impl Notifier for MockEmailNotifier {
  async fn send_order_confirmation(&self, confirmation: &OrderConfirmation) -> Result<()> {
    let subject = confirmation.subject();
    info!(to = %confirmation.recipient_email, from = %self.sender, %subject, "Simulating confirmation e-mail.");
    if self.latency_ms > 0 {
      tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
    }

    let should_fail = self
      .pending_failures
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if should_fail {
      warn!(%subject, "Simulated e-mail failure.");
      return Err(AppError::Notification("Simulated email send failure".to_string()));
    }

    let message_id = format!("mock_email_{}", Uuid::new_v4());
    self.sent.lock().await.push(SentEmail {
      to: confirmation.recipient_email.clone(),
      from: self.sender.clone(),
      subject,
      body: confirmation.render_text(),
      message_id: message_id.clone(),
    });
    info!(%message_id, "Mock e-mail sent.");
    Ok(())
  }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  /// Wait before attempt `n + 1` is `backoff * n`.
  pub backoff: Duration,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      backoff: Duration::from_millis(250),
    }
  }
}

/// Sends the confirmation on a detached task. The handle resolves to whether any attempt
/// succeeded; callers normally drop it.
pub fn dispatch_confirmation(
  notifier: Arc<dyn Notifier>,
  confirmation: OrderConfirmation,
  policy: RetryPolicy,
) -> JoinHandle<bool> {
  let span = tracing::info_span!("notify::order_confirmation", order_id = %confirmation.order_id);
  tokio::spawn(send_with_retries(notifier, confirmation, policy).instrument(span))
}

#[instrument(name = "notify::send_with_retries", skip_all, fields(max_attempts = policy.max_attempts))]
async fn send_with_retries(notifier: Arc<dyn Notifier>, confirmation: OrderConfirmation, policy: RetryPolicy) -> bool {
  for attempt in 1..=policy.max_attempts {
    match notifier.send_order_confirmation(&confirmation).await {
      Ok(()) => {
        info!(attempt, "Order confirmation delivered.");
        return true;
      }
      Err(e) if attempt < policy.max_attempts => {
        warn!(attempt, error = %e, "Order confirmation failed, retrying.");
        tokio::time::sleep(policy.backoff * attempt).await;
      }
      Err(e) => {
        error!(attempt, error = %e, "Order confirmation failed, giving up.");
      }
    }
  }
  false
}

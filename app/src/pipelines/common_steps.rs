// chat_orders/src/pipelines/common_steps.rs

//! Step bodies shared by more than one pipeline.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, OrderWithLines};
use crate::services::cart_service;
use crate::services::notifier::{dispatch_confirmation, OrderConfirmation, RetryPolicy};
use crate::state::AppState;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Loads an order the caller must own. Not-found and not-owned stay distinct.
#[instrument(name = "common_step::load_owned_order", skip(app_state))]
pub async fn load_owned_order(app_state: &AppState, order_id: Uuid, user_id: Uuid) -> AppResult<Order> {
  let order = app_state
    .store
    .find_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  if order.user_id != user_id {
    warn!(owner = %order.user_id, "Caller does not own order.");
    return Err(AppError::Forbidden("You do not own this order".to_string()));
  }
  Ok(order)
}

/// Queues the confirmation e-mail for `order`. Returns whether a send was queued; every
/// failure on the way is logged and swallowed.
#[instrument(name = "common_step::queue_order_confirmation", skip(app_state, order, full_name), fields(order_id = %order.id))]
pub async fn queue_order_confirmation(
  app_state: &AppState,
  order: Order,
  recipient_email: Option<&str>,
  full_name: Option<&str>,
) -> bool {
  let Some(recipient_email) = recipient_email else {
    warn!("No e-mail address for order owner; skipping confirmation.");
    return false;
  };

  let order_with_lines: OrderWithLines =
    match cart_service::load_order_with_lines(app_state.store.as_ref(), app_state.catalog.as_ref(), order).await {
      Ok(o) => o,
      Err(e) => {
        warn!(error = %e, "Could not load order lines for confirmation; skipping.");
        return false;
      }
    };

  if order_with_lines.lines.is_empty() {
    info!("Order has no lines; skipping confirmation.");
    return false;
  }

  let confirmation = OrderConfirmation::from_order(&order_with_lines, recipient_email, full_name);
  let policy = RetryPolicy::new(app_state.config.notify_max_attempts);
  // Detached: the status write has already committed and must not wait on delivery.
  let _ = dispatch_confirmation(app_state.notifier.clone(), confirmation, policy);
  info!(total_cents = order_with_lines.total_cents(), "Order confirmation queued.");
  true
}

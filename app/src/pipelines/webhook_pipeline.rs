// chat_orders/src/pipelines/webhook_pipeline.rs

//! Payment event reconciliation. The signature is checked before the body is parsed.
//! Every write is a plain overwrite, so redelivery is harmless; the store keeps `paid`
//! orders `paid`.

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::{PaymentEvent, PaymentEventKind, WebhookCtxData, WebhookOutcome};
use crate::services::signature;
use serde::Deserialize;
use std::sync::Arc;
use stepflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct RawEvent {
  #[serde(default)]
  id: String,
  #[serde(rename = "type")]
  event_type: String,
  #[serde(default)]
  data: Option<RawEventData>,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
  #[serde(default)]
  object: Option<RawEventObject>,
}

#[derive(Debug, Deserialize)]
struct RawEventObject {
  #[serde(default)]
  metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

fn parse_payment_event(payload: &[u8]) -> Result<PaymentEvent, AppError> {
  let raw: RawEvent =
    serde_json::from_slice(payload).map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;
  let order_reference = raw
    .data
    .and_then(|d| d.object)
    .and_then(|o| o.metadata)
    .and_then(|m| m.get("orderId").and_then(|v| v.as_str()).map(str::to_string));
  Ok(PaymentEvent {
    id: raw.id,
    kind: PaymentEventKind::from_type(&raw.event_type),
    order_reference,
  })
}

fn event_kind_is_not(ctx_data: &ContextData<WebhookCtxData>, kind: PaymentEventKind) -> bool {
  ctx_data.read().event.as_ref().map_or(true, |e| e.kind != kind)
}

async fn apply_status(ctx_data: ContextData<WebhookCtxData>, status: OrderStatus) -> Result<PipelineControl, AppError> {
  let (store, order_id) = {
    let guard = ctx_data.read();
    (guard.app_state.store.clone(), guard.order_id)
  };
  let Some(order_id) = order_id else {
    return Err(AppError::Internal("status write ran without an order id".to_string()));
  };

  match store.set_status(order_id, status).await? {
    Some(order) => {
      info!(%order_id, requested = %status, stored = %order.status, "Payment event applied.");
      ctx_data.write().outcome = WebhookOutcome::Applied(order.status);
    }
    None => {
      warn!(%order_id, "Order disappeared before payment event could be applied.");
      ctx_data.write().outcome = WebhookOutcome::Ignored;
    }
  }
  Ok(PipelineControl::Continue)
}

pub fn register_webhook_pipeline(flows: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<WebhookCtxData, AppError>::new(&[
    ("verify_signature", false, None),
    ("parse_event", false, None),
    ("resolve_order_reference", false, None),
    (
      "apply_payment_succeeded",
      false,
      Some(Arc::new(|ctx_data: ContextData<WebhookCtxData>| {
        event_kind_is_not(&ctx_data, PaymentEventKind::Succeeded)
      })),
    ),
    (
      "apply_payment_failed",
      false,
      Some(Arc::new(|ctx_data: ContextData<WebhookCtxData>| {
        event_kind_is_not(&ctx_data, PaymentEventKind::Failed)
      })),
    ),
  ]);

  p.on_root("verify_signature", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let config = &guard.app_state.config;
      if let Err(e) = signature::verify(
        &guard.payload,
        guard.signature_header.as_deref(),
        &config.payment_webhook_secret,
        config.webhook_tolerance_secs,
        guard.received_at_unix,
      ) {
        error!(security_event = true, reason = %e, "Webhook signature verification failed.");
        return Err(e);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("parse_event", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let payload = ctx_data.read().payload.clone();
      let event = parse_payment_event(&payload)?;
      info!(event_id = %event.id, kind = ?event.kind, "Payment event received.");

      let unhandled = matches!(event.kind, PaymentEventKind::Other(_));
      let mut guard = ctx_data.write();
      guard.event = Some(event);
      if unhandled {
        info!("Unhandled payment event type acknowledged.");
        guard.outcome = WebhookOutcome::Ignored;
        return Ok::<_, AppError>(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("resolve_order_reference", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (store, reference) = {
        let guard = ctx_data.read();
        (
          guard.app_state.store.clone(),
          guard.event.as_ref().and_then(|e| e.order_reference.clone()),
        )
      };

      let Some(order_id) = reference.as_deref().and_then(|r| Uuid::parse_str(r).ok()) else {
        warn!(reference = ?reference, "Payment event has no usable order id; acknowledging.");
        ctx_data.write().outcome = WebhookOutcome::Ignored;
        return Ok::<_, AppError>(PipelineControl::Stop);
      };
      if store.find_order(order_id).await?.is_none() {
        warn!(%order_id, "Payment event references an unknown order; acknowledging.");
        ctx_data.write().outcome = WebhookOutcome::Ignored;
        return Ok(PipelineControl::Stop);
      }
      ctx_data.write().order_id = Some(order_id);
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("apply_payment_succeeded", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(apply_status(ctx_data, OrderStatus::Paid))
  });

  // Failed payment keeps the order locked for a retry; it never returns to pending.
  p.on_root("apply_payment_failed", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(apply_status(ctx_data, OrderStatus::Submitted))
  });

  flows.register_pipeline(p);
  info!("Payment webhook pipeline registered.");
}

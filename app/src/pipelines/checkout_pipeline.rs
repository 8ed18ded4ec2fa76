// chat_orders/src/pipelines/checkout_pipeline.rs

//! Checkout: authorize, require at least one line, lock the order (`pending` to
//! `submitted`), then open a hosted payment session priced from the line snapshots.

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::cart_service;
use crate::services::payment::{CheckoutLineItem, CheckoutSessionRequest};
use std::sync::Arc;
use stepflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{error, info};

pub fn register_checkout_pipeline(flows: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("load_order_for_checkout", false, None),
    ("validate_checkout", false, None),
    (
      "mark_order_submitted",
      false,
      Some(Arc::new(|ctx_data: ContextData<CheckoutCtxData>| {
        let guard = ctx_data.read();
        guard.order.as_ref().map_or(true, |o| o.order.status != OrderStatus::Pending)
      })),
    ),
    ("create_payment_session", false, None),
  ]);

  p.on_root("load_order_for_checkout", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (app_state, order_id, user_id) = {
        let guard = ctx_data.read();
        (guard.app_state.clone(), guard.order_id, guard.user_id)
      };
      let order = common_steps::load_owned_order(&app_state, order_id, user_id).await?;
      let with_lines =
        cart_service::load_order_with_lines(app_state.store.as_ref(), app_state.catalog.as_ref(), order).await?;
      ctx_data.write().order = Some(with_lines);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("validate_checkout", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let has_lines = guard.order.as_ref().map_or(false, |o| !o.lines.is_empty());
      if !has_lines {
        return Err(AppError::Validation("Order has no items".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("mark_order_submitted", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (store, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id)
      };
      let updated = store
        .set_status(order_id, OrderStatus::Submitted)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
      info!(%order_id, status = %updated.status, "Order locked for checkout.");
      if let Some(o) = ctx_data.write().order.as_mut() {
        o.order = updated;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("create_payment_session", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (app_state, request) = {
        let guard = ctx_data.read();
        let Some(order) = guard.order.as_ref() else {
          return Err(AppError::Internal("create_payment_session ran without an order".to_string()));
        };
        let base = &guard.app_state.config.app_base_url;
        let conversation_id = order.order.conversation_id;
        let request = CheckoutSessionRequest {
          order_id: order.order.id,
          conversation_id,
          user_id: guard.user_id,
          currency: guard.app_state.config.currency.clone(),
          line_items: order
            .lines
            .iter()
            .map(|l| CheckoutLineItem {
              name: l.product_name.clone(),
              description: l.product_description.clone(),
              unit_amount_cents: l.line.unit_price_cents,
              quantity: l.line.quantity,
            })
            .collect(),
          customer_email: guard.user_email.clone(),
          success_url: format!("{}/chat/{}?success=true", base, conversation_id),
          cancel_url: format!("{}/chat/{}?canceled=true", base, conversation_id),
        };
        (guard.app_state.clone(), request)
      };

      let session = app_state.payments.create_checkout_session(&request).await.map_err(|e| {
        error!(order_id = %request.order_id, error = %e, "Checkout session creation failed.");
        AppError::ExternalService("Failed to create checkout session".to_string())
      })?;
      info!(order_id = %request.order_id, session_id = %session.id, total_cents = request.total_cents(), "Checkout session ready.");
      ctx_data.write().session = Some(session);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(p);
  info!("Checkout pipeline registered.");
}

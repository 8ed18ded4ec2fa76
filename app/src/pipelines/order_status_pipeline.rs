// chat_orders/src/pipelines/order_status_pipeline.rs

//! Client-requested status changes. Only forward moves are allowed and `paid` is reserved
//! for payment confirmation. The first move into `submitted` queues a confirmation e-mail.

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::StatusUpdateCtxData;
use std::sync::Arc;
use stepflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::info;

pub fn register_order_status_pipeline(flows: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<StatusUpdateCtxData, AppError>::new(&[
    ("authorize_status_change", false, None),
    ("write_status", false, None),
    (
      "queue_confirmation",
      true,
      Some(Arc::new(|ctx_data: ContextData<StatusUpdateCtxData>| {
        let guard = ctx_data.read();
        !(guard.previous == Some(OrderStatus::Pending) && guard.requested == OrderStatus::Submitted)
      })),
    ),
  ]);

  p.on_root("authorize_status_change", |ctx_data: ContextData<StatusUpdateCtxData>| {
    Box::pin(async move {
      let (app_state, order_id, user_id, requested) = {
        let guard = ctx_data.read();
        (guard.app_state.clone(), guard.order_id, guard.user_id, guard.requested)
      };
      let order = common_steps::load_owned_order(&app_state, order_id, user_id).await?;

      if requested == OrderStatus::Paid {
        return Err(AppError::Forbidden(
          "Orders are marked paid by payment confirmation only".to_string(),
        ));
      }
      if !order.status.can_advance_to(requested) {
        return Err(AppError::InvalidState(format!(
          "Cannot move order from {} to {}",
          order.status, requested
        )));
      }
      ctx_data.write().previous = Some(order.status);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("write_status", |ctx_data: ContextData<StatusUpdateCtxData>| {
    Box::pin(async move {
      let (store, order_id, requested) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id, guard.requested)
      };
      let updated = store
        .set_status(order_id, requested)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
      info!(%order_id, status = %updated.status, "Order status written.");
      ctx_data.write().updated = Some(updated);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("queue_confirmation", |ctx_data: ContextData<StatusUpdateCtxData>| {
    Box::pin(async move {
      let (app_state, updated, email, name) = {
        let guard = ctx_data.read();
        (
          guard.app_state.clone(),
          guard.updated.clone(),
          guard.user_email.clone(),
          guard.user_name.clone(),
        )
      };
      let Some(order) = updated else {
        return Ok::<_, AppError>(PipelineControl::Continue);
      };
      let queued = common_steps::queue_order_confirmation(&app_state, order, email.as_deref(), name.as_deref()).await;
      ctx_data.write().confirmation_dispatched = queued;
      Ok(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(p);
  info!("Order status pipeline registered.");
}

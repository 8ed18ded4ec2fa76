// chat_orders/src/pipelines/cart_pipeline.rs

//! Tool-driven cart flows. Ordinary misses (no such product, nothing to remove, order
//! already submitted) end the run with `Stop` and a sentence in `outcome`; only real
//! failures come back as errors.

use crate::errors::AppError;
use crate::models::{format_cents, MenuFilter};
use crate::pipelines::contexts::{AddItemCtxData, RemoveItemCtxData};
use crate::services::cart_service;
use std::sync::Arc;
use stepflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{info, warn};

const LOCKED_ORDER_TEXT: &str = "Your order has already been submitted and can no longer be changed.";

pub fn register_add_item_pipeline(flows: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<AddItemCtxData, AppError>::new(&[
    ("resolve_product", false, None),
    ("get_or_create_order", false, None),
    ("add_line", false, None),
    ("narrate_addition", false, None),
  ]);

  p.on_root("resolve_product", |ctx_data: ContextData<AddItemCtxData>| {
    Box::pin(async move {
      let (catalog, product_name) = {
        let guard = ctx_data.read();
        (guard.app_state.catalog.clone(), guard.product_name.clone())
      };

      let filter = MenuFilter {
        name: Some(product_name.clone()),
        ..Default::default()
      };
      let first_match = catalog.search(&filter).await?.into_iter().next();
      match first_match {
        Some(product) => {
          info!(product_id = %product.id, product = %product.name, "Resolved product for add.");
          ctx_data.write().product = Some(product);
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        None => {
          ctx_data.write().outcome = Some(format!(
            "Sorry, I couldn't find a menu item matching \"{}\".",
            product_name
          ));
          Ok(PipelineControl::Stop)
        }
      }
    })
  });

  p.on_root("get_or_create_order", |ctx_data: ContextData<AddItemCtxData>| {
    Box::pin(async move {
      let (store, tool_ctx) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.tool_ctx.clone())
      };
      let order = cart_service::get_or_create_order(store.as_ref(), tool_ctx.conversation_id, tool_ctx.user_id).await?;
      let editable = order.status.is_editable();
      ctx_data.write().order = Some(order);

      if !editable {
        ctx_data.write().outcome = Some(LOCKED_ORDER_TEXT.to_string());
        return Ok::<_, AppError>(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("add_line", |ctx_data: ContextData<AddItemCtxData>| {
    Box::pin(async move {
      let (store, catalog, order_id, product_id, quantity, modifications) = {
        let guard = ctx_data.read();
        let order_id = guard.order.as_ref().map(|o| o.id);
        let product_id = guard.product.as_ref().map(|p| p.id);
        (
          guard.app_state.store.clone(),
          guard.app_state.catalog.clone(),
          order_id,
          product_id,
          guard.quantity,
          guard.modifications.clone(),
        )
      };
      let (Some(order_id), Some(product_id)) = (order_id, product_id) else {
        return Err(AppError::Internal("add_line ran without an order and product".to_string()));
      };

      match cart_service::add_item(store.as_ref(), catalog.as_ref(), order_id, product_id, quantity, modifications).await {
        Ok(line) => {
          ctx_data.write().added_line = Some(line);
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        // Lost a race with checkout between reading the order and inserting the line.
        Err(AppError::InvalidState(reason)) => {
          warn!(%reason, "Order locked before line was added.");
          ctx_data.write().outcome = Some(LOCKED_ORDER_TEXT.to_string());
          Ok(PipelineControl::Stop)
        }
        Err(e) => Err(e),
      }
    })
  });

  p.on_root("narrate_addition", |ctx_data: ContextData<AddItemCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let text = match (&guard.product, &guard.added_line) {
        (Some(product), Some(line)) => format!(
          "Added {} x {} (${} each) to your order.",
          line.quantity,
          product.name,
          format_cents(line.unit_price_cents)
        ),
        _ => return Err(AppError::Internal("narrate_addition ran without an added line".to_string())),
      };
      guard.outcome = Some(text);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register_pipeline(p);
  info!("Add item pipeline registered.");
}

pub fn register_remove_item_pipeline(flows: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<RemoveItemCtxData, AppError>::new(&[
    ("load_conversation_order", false, None),
    ("match_line", false, None),
    ("remove_line", false, None),
  ]);

  p.on_root("load_conversation_order", |ctx_data: ContextData<RemoveItemCtxData>| {
    Box::pin(async move {
      let (store, catalog, conversation_id) = {
        let guard = ctx_data.read();
        (
          guard.app_state.store.clone(),
          guard.app_state.catalog.clone(),
          guard.tool_ctx.conversation_id,
        )
      };
      let order = cart_service::order_for_conversation(store.as_ref(), catalog.as_ref(), conversation_id).await?;
      match order {
        Some(order) if !order.lines.is_empty() => {
          ctx_data.write().order = Some(order);
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        _ => {
          ctx_data.write().outcome = Some("There are no items in your order yet.".to_string());
          Ok(PipelineControl::Stop)
        }
      }
    })
  });

  p.on_root("match_line", |ctx_data: ContextData<RemoveItemCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let needle = guard.product_name.to_lowercase();
      let matched = guard
        .order
        .as_ref()
        .and_then(|o| o.lines.iter().find(|l| l.product_name.to_lowercase().contains(&needle)))
        .cloned();
      match matched {
        Some(line) => {
          guard.matched_line = Some(line);
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        None => {
          guard.outcome = Some(format!(
            "I couldn't find \"{}\" in your order.",
            guard.product_name
          ));
          Ok(PipelineControl::Stop)
        }
      }
    })
  });

  p.on_root("remove_line", |ctx_data: ContextData<RemoveItemCtxData>| {
    Box::pin(async move {
      let (store, user_id, matched) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.tool_ctx.user_id, guard.matched_line.clone())
      };
      let Some(matched) = matched else {
        return Err(AppError::Internal("remove_line ran without a matched line".to_string()));
      };

      match cart_service::remove_item(store.as_ref(), matched.line.id, user_id).await {
        Ok(removed) => {
          let mut guard = ctx_data.write();
          guard.removed_line = Some(removed);
          guard.outcome = Some(format!("Removed {} from your order.", matched.product_name));
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        Err(AppError::InvalidState(_)) => {
          ctx_data.write().outcome = Some(LOCKED_ORDER_TEXT.to_string());
          Ok(PipelineControl::Stop)
        }
        Err(e) => Err(e),
      }
    })
  });

  flows.register_pipeline(p);
  info!("Remove item pipeline registered.");
}

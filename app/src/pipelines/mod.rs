// chat_orders/src/pipelines/mod.rs

//! Pipeline definitions, registered once at startup and dispatched per request by context type.

use crate::errors::AppError;
use std::sync::Arc;
use stepflow::FlowRegistry;

pub mod contexts;
pub mod common_steps;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod order_status_pipeline;
pub mod webhook_pipeline;

pub fn register_all_pipelines(flows: &Arc<FlowRegistry<AppError>>) {
  tracing::info!("Registering pipelines...");

  cart_pipeline::register_add_item_pipeline(flows);
  cart_pipeline::register_remove_item_pipeline(flows);
  checkout_pipeline::register_checkout_pipeline(flows);
  order_status_pipeline::register_order_status_pipeline(flows);
  webhook_pipeline::register_webhook_pipeline(flows);

  tracing::info!("All application pipelines registered.");
}

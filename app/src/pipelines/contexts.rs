// chat_orders/src/pipelines/contexts.rs

//! Data each pipeline runs over. Callers build one, hand it to the registry wrapped in
//! `stepflow::ContextData`, and read the outcome fields back afterwards.

use crate::models::{Modifications, Order, OrderLine, OrderLineDetail, OrderStatus, OrderWithLines, Product};
use crate::services::payment::CheckoutSession;
use crate::state::AppState;
use crate::tools::ToolContext;
use actix_web::web::Bytes;
use uuid::Uuid;

#[derive(Clone)]
pub struct AddItemCtxData {
  pub app_state: AppState,
  pub tool_ctx: ToolContext,
  pub product_name: String,
  pub quantity: i32,
  pub modifications: Option<Modifications>,
  pub product: Option<Product>,
  pub order: Option<Order>,
  pub added_line: Option<OrderLine>,
  /// Text handed back to the agent.
  pub outcome: Option<String>,
}

impl AddItemCtxData {
  pub fn new(
    app_state: AppState,
    tool_ctx: ToolContext,
    product_name: String,
    quantity: i32,
    modifications: Option<Modifications>,
  ) -> Self {
    Self {
      app_state,
      tool_ctx,
      product_name,
      quantity,
      modifications,
      product: None,
      order: None,
      added_line: None,
      outcome: None,
    }
  }
}

#[derive(Clone)]
pub struct RemoveItemCtxData {
  pub app_state: AppState,
  pub tool_ctx: ToolContext,
  pub product_name: String,
  pub order: Option<OrderWithLines>,
  pub matched_line: Option<OrderLineDetail>,
  pub removed_line: Option<OrderLine>,
  pub outcome: Option<String>,
}

impl RemoveItemCtxData {
  pub fn new(app_state: AppState, tool_ctx: ToolContext, product_name: String) -> Self {
    Self {
      app_state,
      tool_ctx,
      product_name,
      order: None,
      matched_line: None,
      removed_line: None,
      outcome: None,
    }
  }
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub user_email: Option<String>,
  pub order_id: Uuid,
  pub order: Option<OrderWithLines>,
  pub session: Option<CheckoutSession>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, user_email: Option<String>, order_id: Uuid) -> Self {
    Self {
      app_state,
      user_id,
      user_email,
      order_id,
      order: None,
      session: None,
    }
  }
}

#[derive(Clone)]
pub struct StatusUpdateCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub user_email: Option<String>,
  pub user_name: Option<String>,
  pub order_id: Uuid,
  pub requested: OrderStatus,
  pub previous: Option<OrderStatus>,
  pub updated: Option<Order>,
  pub confirmation_dispatched: bool,
}

impl StatusUpdateCtxData {
  pub fn new(
    app_state: AppState,
    user_id: Uuid,
    user_email: Option<String>,
    user_name: Option<String>,
    order_id: Uuid,
    requested: OrderStatus,
  ) -> Self {
    Self {
      app_state,
      user_id,
      user_email,
      user_name,
      order_id,
      requested,
      previous: None,
      updated: None,
      confirmation_dispatched: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
  /// `checkout.session.completed`
  Succeeded,
  /// `payment_intent.payment_failed`
  Failed,
  Other(String),
}

impl PaymentEventKind {
  pub fn from_type(event_type: &str) -> Self {
    match event_type {
      "checkout.session.completed" => PaymentEventKind::Succeeded,
      "payment_intent.payment_failed" => PaymentEventKind::Failed,
      other => PaymentEventKind::Other(other.to_string()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
  pub id: String,
  pub kind: PaymentEventKind,
  /// Raw `metadata.orderId`, if the event carried one.
  pub order_reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
  Pending,
  Applied(OrderStatus),
  /// Acknowledged without a state change (unhandled type, missing or unknown order).
  Ignored,
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  pub payload: Bytes,
  pub signature_header: Option<String>,
  pub received_at_unix: i64,
  pub event: Option<PaymentEvent>,
  pub order_id: Option<Uuid>,
  pub outcome: WebhookOutcome,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, payload: Bytes, signature_header: Option<String>, received_at_unix: i64) -> Self {
    Self {
      app_state,
      payload,
      signature_header,
      received_at_unix,
      event: None,
      order_id: None,
      outcome: WebhookOutcome::Pending,
    }
  }
}

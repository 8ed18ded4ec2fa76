// chat_orders/src/web/handlers/order_handlers.rs

use super::extractors::AuthenticatedUser;
use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::StatusUpdateCtxData;
use crate::services::cart_service;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use stepflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
  pub conversation_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
  pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
  pub order_id: Uuid,
  pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLinePayload {
  pub order_item_id: Uuid,
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
  raw.parse::<OrderStatus>().map_err(AppError::Validation)
}

#[instrument(
  name = "handler::conversation_order",
  skip(app_state, auth_user, query),
  fields(user_id = %auth_user.user_id, conversation_id = %query.conversation_id)
)]
pub async fn conversation_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<ConversationQuery>,
) -> Result<HttpResponse, AppError> {
  let order = cart_service::order_for_conversation(
    app_state.store.as_ref(),
    app_state.catalog.as_ref(),
    query.conversation_id,
  )
  .await?;

  match order {
    Some(order) if order.order.user_id != auth_user.user_id => {
      warn!(order_id = %order.order.id, "Caller does not own the conversation's order.");
      Err(AppError::Forbidden("Order belongs to another user".to_string()))
    }
    Some(order) => Ok(HttpResponse::Ok().json(order)),
    None => Ok(HttpResponse::Ok().json(serde_json::Value::Null)),
  }
}

#[instrument(name = "handler::my_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn my_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
  let status = query.status.as_deref().map(parse_status).transpose()?;
  let orders = cart_service::orders_for_user(
    app_state.store.as_ref(),
    app_state.catalog.as_ref(),
    auth_user.user_id,
    status,
  )
  .await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, auth_user, payload),
  fields(user_id = %auth_user.user_id, order_id = %payload.order_id)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let requested = parse_status(&payload.status)?;
  let ctx_data = ContextData::new(StatusUpdateCtxData::new(
    app_state.get_ref().clone(),
    auth_user.user_id,
    auth_user.email.clone(),
    auth_user.name.clone(),
    payload.order_id,
    requested,
  ));

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx_data.read();
      let updated = guard.updated.as_ref().ok_or_else(|| {
        warn!("Status pipeline completed without an updated order.");
        AppError::Internal("Status update finished without a result".to_string())
      })?;
      info!(status = %updated.status, confirmation = guard.confirmation_dispatched, "Order status updated.");
      Ok(HttpResponse::Ok().json(updated))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Status update was halted".to_string())),
  }
}

#[instrument(
  name = "handler::remove_order_line",
  skip(app_state, auth_user, payload),
  fields(user_id = %auth_user.user_id, order_item_id = %payload.order_item_id)
)]
pub async fn remove_order_line_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<RemoveLinePayload>,
) -> Result<HttpResponse, AppError> {
  let removed = cart_service::remove_item(app_state.store.as_ref(), payload.order_item_id, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

// chat_orders/src/web/handlers/checkout_handlers.rs

use super::extractors::AuthenticatedUser;
use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use stepflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
  pub order_id: Uuid,
}

#[instrument(
  name = "handler::start_checkout",
  skip(app_state, auth_user, payload),
  fields(user_id = %auth_user.user_id, order_id = %payload.order_id)
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx_data = ContextData::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    auth_user.user_id,
    auth_user.email.clone(),
    payload.order_id,
  ));

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx_data.read();
      let session = guard.session.as_ref().ok_or_else(|| {
        warn!("Checkout pipeline completed without a session.");
        AppError::Internal("Checkout finished without a payment session".to_string())
      })?;
      info!(session_id = %session.id, "Checkout session ready.");
      Ok(HttpResponse::Ok().json(json!({ "sessionId": session.id, "url": session.url })))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Checkout was halted".to_string())),
  }
}

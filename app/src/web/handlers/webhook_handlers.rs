// chat_orders/src/web/handlers/webhook_handlers.rs

use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtxData;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use stepflow::ContextData;
use tracing::{info, instrument};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Acknowledges every authentic event, including ones that changed nothing, so the
/// processor stops redelivering them.
#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(String::from);

  let ctx_data = ContextData::new(WebhookCtxData::new(
    app_state.get_ref().clone(),
    body,
    signature_header,
    chrono::Utc::now().timestamp(),
  ));

  let result = app_state.flows.run(ctx_data.clone()).await?;
  let outcome = ctx_data.read().outcome;
  info!(?result, ?outcome, "Payment webhook acknowledged.");
  Ok(HttpResponse::Ok().json(json!({ "received": true })))
}

// chat_orders/src/web/handlers/tool_handlers.rs

use super::extractors::AuthenticatedUser;
use crate::errors::AppError;
use crate::state::AppState;
use crate::tools::{self, ToolContext};
use actix_web::{web, HttpResponse};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

/// An empty body means no arguments; anything else must be well-formed JSON.
fn parse_body(body: &[u8]) -> Result<Value, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(Value::Null);
  }
  serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Tool arguments are not valid JSON: {}", e)))
}

pub async fn list_tools_handler() -> HttpResponse {
  HttpResponse::Ok().json(tools::definitions())
}

#[instrument(
  name = "handler::run_tool",
  skip(app_state, auth_user, path, body),
  fields(user_id = %auth_user.user_id)
)]
pub async fn run_tool_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<(Uuid, String)>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let (conversation_id, tool_name) = path.into_inner();
  let ctx = ToolContext::new(Some(conversation_id), Some(auth_user.user_id))?;
  let args = parse_body(&body)?;

  let result = tools::execute(app_state.get_ref(), &ctx, &tool_name, args).await?;
  info!(%conversation_id, tool = %tool_name, "Tool call answered.");
  Ok(HttpResponse::Ok().json(json!({ "tool": tool_name, "result": result })))
}

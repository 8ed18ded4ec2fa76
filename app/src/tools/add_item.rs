// chat_orders/src/tools/add_item.rs

use super::{require_non_blank, Tool, ToolContext};
use crate::errors::{AppError, Result};
use crate::models::Modifications;
use crate::pipelines::contexts::AddItemCtxData;
use crate::state::AppState;
use serde::Deserialize;
use stepflow::ContextData;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddItemArgs {
  pub product_name: String,
  pub quantity: i32,
  #[serde(default)]
  pub modifications: Option<Modifications>,
}

impl AddItemArgs {
  fn validate(&self) -> Result<()> {
    require_non_blank(Tool::AddItemToOrder, "productName", &self.product_name)?;
    if self.quantity < 1 {
      return Err(AppError::Validation(format!(
        "Invalid arguments for {}: quantity must be at least 1",
        Tool::AddItemToOrder.name()
      )));
    }
    Ok(())
  }
}

pub async fn run(state: &AppState, ctx: &ToolContext, args: AddItemArgs) -> Result<String> {
  args.validate()?;
  let ctx_data = ContextData::new(AddItemCtxData::new(
    state.clone(),
    ctx.clone(),
    args.product_name.trim().to_string(),
    args.quantity,
    args.modifications,
  ));

  // Misses stop the pipeline early but still leave an outcome to relay.
  let result = state.flows.run(ctx_data.clone()).await?;
  let outcome = ctx_data.read().outcome.clone();
  outcome.ok_or_else(|| {
    warn!(?result, "Add item pipeline finished without an outcome.");
    AppError::Internal("Add item finished without a result".to_string())
  })
}

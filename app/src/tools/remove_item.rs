// chat_orders/src/tools/remove_item.rs

use super::{require_non_blank, Tool, ToolContext};
use crate::errors::{AppError, Result};
use crate::pipelines::contexts::RemoveItemCtxData;
use crate::state::AppState;
use serde::Deserialize;
use stepflow::ContextData;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoveItemArgs {
  pub product_name: String,
}

pub async fn run(state: &AppState, ctx: &ToolContext, args: RemoveItemArgs) -> Result<String> {
  require_non_blank(Tool::RemoveItemFromOrder, "productName", &args.product_name)?;
  let ctx_data = ContextData::new(RemoveItemCtxData::new(
    state.clone(),
    ctx.clone(),
    args.product_name.trim().to_string(),
  ));

  state.flows.run(ctx_data.clone()).await?;
  let outcome = ctx_data.read().outcome.clone();
  outcome.ok_or_else(|| AppError::Internal("Remove item finished without a result".to_string()))
}

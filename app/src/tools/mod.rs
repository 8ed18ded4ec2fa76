// chat_orders/src/tools/mod.rs

//! Named, schema-checked operations the conversational agent can call. Every tool returns
//! the sentence the agent should relay; ordinary misses are sentences too, never errors.

use crate::errors::{AppError, Result};
use crate::state::AppState;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

pub mod add_item;
pub mod menu_query;
pub mod remove_item;

/// Who is calling and on behalf of which conversation. Supplied explicitly with every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
  pub conversation_id: Uuid,
  pub user_id: Uuid,
}

impl ToolContext {
  /// Missing identity is a wiring fault in the caller, so it is a configuration error.
  pub fn new(conversation_id: Option<Uuid>, user_id: Option<Uuid>) -> Result<Self> {
    match (conversation_id, user_id) {
      (Some(conversation_id), Some(user_id)) => Ok(Self { conversation_id, user_id }),
      (None, _) => Err(AppError::Config("Tool invoked without a conversation id".to_string())),
      (_, None) => Err(AppError::Config("Tool invoked without a user id".to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
  MenuQuery,
  AddItemToOrder,
  RemoveItemFromOrder,
}

impl Tool {
  pub const ALL: [Tool; 3] = [Tool::MenuQuery, Tool::AddItemToOrder, Tool::RemoveItemFromOrder];

  pub fn name(self) -> &'static str {
    match self {
      Tool::MenuQuery => "menuQuery",
      Tool::AddItemToOrder => "addItemToOrder",
      Tool::RemoveItemFromOrder => "removeItemFromOrder",
    }
  }

  pub fn from_name(name: &str) -> Option<Tool> {
    Tool::ALL.into_iter().find(|t| t.name() == name)
  }

  pub fn description(self) -> &'static str {
    match self {
      Tool::MenuQuery => "Query the menu for products with filters like price, category, or name.",
      Tool::AddItemToOrder => "Add a menu item to the customer's order for this conversation.",
      Tool::RemoveItemFromOrder => "Remove a menu item from the customer's order for this conversation.",
    }
  }

  pub fn parameters_schema(self) -> Value {
    match self {
      Tool::MenuQuery => json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
          "category": { "type": "string", "enum": ["breakfast", "entree", "sandwich", "flatbread", "dessert"] },
          "minPrice": { "type": "number", "description": "Minimum price in dollars" },
          "maxPrice": { "type": "number", "description": "Maximum price in dollars" },
          "name": { "type": "string", "description": "Case-insensitive part of the item name" }
        }
      }),
      Tool::AddItemToOrder => json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["productName", "quantity"],
        "properties": {
          "productName": { "type": "string", "minLength": 1 },
          "quantity": { "type": "integer", "minimum": 1 },
          "modifications": { "type": "object", "description": "Customer requests such as substitutions" }
        }
      }),
      Tool::RemoveItemFromOrder => json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["productName"],
        "properties": {
          "productName": { "type": "string", "minLength": 1 }
        }
      }),
    }
  }
}

/// Tool definitions in the shape agent runtimes expect.
pub fn definitions() -> Value {
  Value::Array(
    Tool::ALL
      .into_iter()
      .map(|t| {
        json!({
          "name": t.name(),
          "description": t.description(),
          "parameters": t.parameters_schema(),
        })
      })
      .collect(),
  )
}

/// Deserializes tool arguments, turning any schema violation into a validation error.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: Tool, args: Value) -> Result<T> {
  let args = if args.is_null() { json!({}) } else { args };
  serde_json::from_value(args).map_err(|e| AppError::Validation(format!("Invalid arguments for {}: {}", tool.name(), e)))
}

pub(crate) fn require_non_blank(tool: Tool, field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(AppError::Validation(format!(
      "Invalid arguments for {}: {} must not be empty",
      tool.name(),
      field
    )));
  }
  Ok(())
}

#[instrument(name = "tools::execute", skip(state, args), fields(conversation_id = %ctx.conversation_id, user_id = %ctx.user_id))]
pub async fn execute(state: &AppState, ctx: &ToolContext, tool_name: &str, args: Value) -> Result<String> {
  let tool = Tool::from_name(tool_name).ok_or_else(|| AppError::NotFound(format!("Unknown tool '{}'", tool_name)))?;
  let result = match tool {
    Tool::MenuQuery => menu_query::run(state, parse_args(tool, args)?).await,
    Tool::AddItemToOrder => add_item::run(state, ctx, parse_args(tool, args)?).await,
    Tool::RemoveItemFromOrder => remove_item::run(state, ctx, parse_args(tool, args)?).await,
  }?;
  info!(tool = tool.name(), "Tool executed.");
  Ok(result)
}

// chat_orders/src/tools/menu_query.rs

use super::Tool;
use crate::errors::Result;
use crate::models::{format_cents, MenuFilter, Product};
use crate::state::AppState;
use serde::Deserialize;

pub const NO_RESULTS_TEXT: &str = "No menu items found matching your criteria.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MenuQueryArgs {
  pub category: Option<String>,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  pub name: Option<String>,
}

impl MenuQueryArgs {
  pub fn to_filter(&self) -> MenuFilter {
    MenuFilter::from_loose(
      self.category.as_deref(),
      self.min_price,
      self.max_price,
      self.name.as_deref(),
    )
  }
}

pub fn format_menu_line(product: &Product) -> String {
  let mut line = format!(
    "* {} (${}): {} {}",
    product.name,
    format_cents(product.price_cents),
    product.quantity,
    product.units
  );
  if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
    line.push_str(" — ");
    line.push_str(description);
  }
  line
}

pub fn format_menu(products: &[Product]) -> String {
  if products.is_empty() {
    return NO_RESULTS_TEXT.to_string();
  }
  products.iter().map(format_menu_line).collect::<Vec<_>>().join("\n")
}

pub async fn run(state: &AppState, args: MenuQueryArgs) -> Result<String> {
  tracing::debug!(tool = Tool::MenuQuery.name(), ?args, "Querying menu.");
  let products = state.catalog.search(&args.to_filter()).await?;
  Ok(format_menu(&products))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::errors::AppError;
  use crate::tools::parse_args;
  use chrono::Utc;
  use uuid::Uuid;

  fn product(description: Option<&str>) -> Product {
    Product {
      id: Uuid::new_v4(),
      name: "Egg Sandwich".to_string(),
      description: description.map(str::to_string),
      price_cents: 950,
      category: "sandwich".to_string(),
      quantity: 1,
      units: "sandwich".to_string(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn formats_line_with_and_without_description() {
    assert_eq!(
      format_menu_line(&product(Some("Fried egg on brioche"))),
      "* Egg Sandwich ($9.50): 1 sandwich — Fried egg on brioche"
    );
    assert_eq!(format_menu_line(&product(None)), "* Egg Sandwich ($9.50): 1 sandwich");
  }

  #[test]
  fn empty_result_uses_fixed_text() {
    assert_eq!(format_menu(&[]), NO_RESULTS_TEXT);
  }

  #[test]
  fn rejects_unknown_fields_and_wrong_types() {
    let unknown = parse_args::<MenuQueryArgs>(Tool::MenuQuery, serde_json::json!({"colour": "red"}));
    assert!(matches!(unknown, Err(AppError::Validation(_))));
    let wrong_type = parse_args::<MenuQueryArgs>(Tool::MenuQuery, serde_json::json!({"maxPrice": "cheap"}));
    assert!(matches!(wrong_type, Err(AppError::Validation(_))));
  }

  #[test]
  fn null_args_mean_no_filters() {
    let args = parse_args::<MenuQueryArgs>(Tool::MenuQuery, serde_json::Value::Null).unwrap();
    assert_eq!(args.to_filter(), MenuFilter::default());
  }
}

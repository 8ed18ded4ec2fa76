// chat_orders/src/models/order_line.rs

use super::order::Order;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Free-form customer requests attached to a line ("no onions", `{"bread": "rye"}`).
pub type Modifications = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  /// Catalog price at the moment the line was added.
  pub unit_price_cents: i64,
  pub modifications: Option<Json<Modifications>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderLine {
  pub fn line_total_cents(&self) -> i64 {
    self.unit_price_cents * i64::from(self.quantity)
  }
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub modifications: Option<Modifications>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDetail {
  #[serde(flatten)]
  pub line: OrderLine,
  pub product_name: String,
  pub product_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithLines {
  #[serde(flatten)]
  pub order: Order,
  pub lines: Vec<OrderLineDetail>,
}

impl OrderWithLines {
  pub fn total_cents(&self) -> i64 {
    self.lines.iter().map(|l| l.line.line_total_cents()).sum()
  }
}

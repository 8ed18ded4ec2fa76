// chat_orders/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Submitted,
  Paid,
}

impl OrderStatus {
  fn rank(self) -> u8 {
    match self {
      OrderStatus::Pending => 0,
      OrderStatus::Submitted => 1,
      OrderStatus::Paid => 2,
    }
  }

  /// Forward-only moves, plus staying put. `Paid` is terminal.
  pub fn can_advance_to(self, next: OrderStatus) -> bool {
    next.rank() >= self.rank()
  }

  /// Only pending orders accept line changes.
  pub fn is_editable(self) -> bool {
    self == OrderStatus::Pending
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Submitted => "submitted",
      OrderStatus::Paid => "paid",
    }
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "submitted" => Ok(OrderStatus::Submitted),
      "paid" => Ok(OrderStatus::Paid),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub conversation_id: Uuid,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: Uuid,
  pub conversation_id: Uuid,
}

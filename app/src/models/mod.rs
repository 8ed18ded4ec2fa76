// chat_orders/src/models/mod.rs

//! Rows and read models for the catalog, orders and order lines.

pub mod order;
pub mod order_line;
pub mod product;

pub use order::{NewOrder, Order, OrderStatus};
pub use order_line::{Modifications, NewOrderLine, OrderLine, OrderLineDetail, OrderWithLines};
pub use product::{Category, MenuFilter, Product};

/// Renders integer cents as dollars, e.g. `1250` as `12.50`.
pub fn format_cents(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
  use super::format_cents;

  #[test]
  fn formats_cents_as_dollars() {
    assert_eq!(format_cents(0), "0.00");
    assert_eq!(format_cents(5), "0.05");
    assert_eq!(format_cents(1250), "12.50");
    assert_eq!(format_cents(-199), "-1.99");
  }
}

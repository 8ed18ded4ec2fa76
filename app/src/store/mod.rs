// chat_orders/src/store/mod.rs

//! Persistence ports. `postgres` backs the server, `in_memory` backs tests and local runs
//! without a database. Both enforce one order per conversation and cascade line deletion.

use crate::errors::Result;
use crate::models::{MenuFilter, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, Product};
use async_trait::async_trait;
use uuid::Uuid;

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryCatalog, InMemoryOrderStore};
pub use postgres::{PgCatalog, PgOrderStore};

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>>;

  async fn find_order_by_conversation(&self, conversation_id: Uuid) -> Result<Option<Order>>;

  /// Fails with `AppError::Conflict` when the conversation already has an order.
  async fn insert_order(&self, new_order: NewOrder) -> Result<Order>;

  /// Overwrites the status, except that a `paid` order stays `paid`. Returns the stored
  /// order, or `None` when no such order exists.
  async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>>;

  async fn insert_line(&self, new_line: NewOrderLine) -> Result<OrderLine>;

  async fn find_line(&self, line_id: Uuid) -> Result<Option<OrderLine>>;

  /// Returns the deleted line, or `None` if it was already gone.
  async fn delete_line(&self, line_id: Uuid) -> Result<Option<OrderLine>>;

  /// Lines of one order, oldest first.
  async fn lines_for_order(&self, order_id: Uuid) -> Result<Vec<OrderLine>>;

  /// The user's orders, newest first, optionally narrowed to one status.
  async fn orders_for_user(&self, user_id: Uuid, status: Option<OrderStatus>) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait Catalog: Send + Sync {
  /// Matching products in catalog order (creation time, then id).
  async fn search(&self, filter: &MenuFilter) -> Result<Vec<Product>>;

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>>;

  async fn products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>>;
}

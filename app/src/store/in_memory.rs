// chat_orders/src/store/in_memory.rs

use super::{Catalog, OrderStore};
use crate::errors::{AppError, Result};
use crate::models::{Category, MenuFilter, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, Product};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// `(name, description, price_cents, category, quantity, units)`
pub type MenuEntry = (&'static str, Option<&'static str>, i64, Category, i32, &'static str);

pub const DEMO_MENU: [MenuEntry; 8] = [
  ("Egg Sandwich", Some("Fried egg, cheddar and chive aioli on brioche"), 950, Category::Sandwich, 1, "sandwich"),
  ("Breakfast Burrito", Some("Scrambled eggs, potatoes, salsa verde"), 1100, Category::Breakfast, 1, "burrito"),
  ("Overnight Oats", None, 650, Category::Breakfast, 12, "oz"),
  ("Chicken Flatbread", Some("Roast chicken, pesto, mozzarella"), 1300, Category::Flatbread, 1, "flatbread"),
  ("Margherita Flatbread", Some("Tomato, basil, fresh mozzarella"), 1150, Category::Flatbread, 1, "flatbread"),
  ("Salmon Bowl", Some("Roast salmon, rice, greens, miso dressing"), 1650, Category::Entree, 1, "bowl"),
  ("Turkey Club", Some("Turkey, bacon, lettuce, tomato on sourdough"), 1250, Category::Sandwich, 1, "sandwich"),
  ("Chocolate Chip Cookie", None, 350, Category::Dessert, 2, "cookies"),
];

#[derive(Default)]
struct OrderTables {
  orders: HashMap<Uuid, Order>,
  by_conversation: HashMap<Uuid, Uuid>,
  lines: HashMap<Uuid, OrderLine>,
}

/// Orders and lines behind one lock so uniqueness and cascade checks are atomic.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
  tables: Arc<RwLock<OrderTables>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Removes an order and, like the `ON DELETE CASCADE` on `order_items`, all of its lines.
  pub async fn delete_order(&self, order_id: Uuid) -> Option<Order> {
    let mut tables = self.tables.write().await;
    let order = tables.orders.remove(&order_id)?;
    tables.by_conversation.remove(&order.conversation_id);
    tables.lines.retain(|_, line| line.order_id != order_id);
    Some(order)
  }

  pub async fn line_count(&self) -> usize {
    self.tables.read().await.lines.len()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.read().await.orders.get(&order_id).cloned())
  }

  async fn find_order_by_conversation(&self, conversation_id: Uuid) -> Result<Option<Order>> {
    let tables = self.tables.read().await;
    Ok(
      tables
        .by_conversation
        .get(&conversation_id)
        .and_then(|id| tables.orders.get(id))
        .cloned(),
    )
  }

  async fn insert_order(&self, new_order: NewOrder) -> Result<Order> {
    let mut tables = self.tables.write().await;
    if tables.by_conversation.contains_key(&new_order.conversation_id) {
      return Err(AppError::Conflict(format!(
        "conversation {} already has an order",
        new_order.conversation_id
      )));
    }
    let now = Utc::now();
    let order = Order {
      id: Uuid::new_v4(),
      user_id: new_order.user_id,
      conversation_id: new_order.conversation_id,
      status: OrderStatus::Pending,
      created_at: now,
      updated_at: now,
    };
    tables.by_conversation.insert(order.conversation_id, order.id);
    tables.orders.insert(order.id, order.clone());
    Ok(order)
  }

  async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
    let mut tables = self.tables.write().await;
    let Some(order) = tables.orders.get_mut(&order_id) else {
      return Ok(None);
    };
    if order.status != OrderStatus::Paid {
      order.status = status;
    }
    order.updated_at = Utc::now();
    Ok(Some(order.clone()))
  }

  async fn insert_line(&self, new_line: NewOrderLine) -> Result<OrderLine> {
    let mut tables = self.tables.write().await;
    if !tables.orders.contains_key(&new_line.order_id) {
      return Err(AppError::NotFound(format!("Order {} not found", new_line.order_id)));
    }
    let now = Utc::now();
    let line = OrderLine {
      id: Uuid::new_v4(),
      order_id: new_line.order_id,
      product_id: new_line.product_id,
      quantity: new_line.quantity,
      unit_price_cents: new_line.unit_price_cents,
      modifications: new_line.modifications.map(Json),
      created_at: now,
      updated_at: now,
    };
    tables.lines.insert(line.id, line.clone());
    Ok(line)
  }

  async fn find_line(&self, line_id: Uuid) -> Result<Option<OrderLine>> {
    Ok(self.tables.read().await.lines.get(&line_id).cloned())
  }

  async fn delete_line(&self, line_id: Uuid) -> Result<Option<OrderLine>> {
    Ok(self.tables.write().await.lines.remove(&line_id))
  }

  async fn lines_for_order(&self, order_id: Uuid) -> Result<Vec<OrderLine>> {
    let tables = self.tables.read().await;
    let mut lines: Vec<OrderLine> = tables.lines.values().filter(|l| l.order_id == order_id).cloned().collect();
    lines.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(lines)
  }

  async fn orders_for_user(&self, user_id: Uuid, status: Option<OrderStatus>) -> Result<Vec<Order>> {
    let tables = self.tables.read().await;
    let mut orders: Vec<Order> = tables
      .orders
      .values()
      .filter(|o| o.user_id == user_id && status.map_or(true, |s| o.status == s))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    Ok(orders)
  }
}

/// Catalog held in insertion order, which doubles as catalog order.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
  products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_demo_menu() -> Self {
    let base = Utc::now();
    let products = DEMO_MENU
      .iter()
      .copied()
      .enumerate()
      .map(|(i, (name, description, price_cents, category, quantity, units))| {
        let created_at = base + Duration::milliseconds(i as i64);
        Product {
          id: Uuid::new_v4(),
          name: name.to_string(),
          description: description.map(str::to_string),
          price_cents,
          category: category.as_str().to_string(),
          quantity,
          units: units.to_string(),
          created_at,
          updated_at: created_at,
        }
      })
      .collect();
    Self {
      products: Arc::new(RwLock::new(products)),
    }
  }

  pub async fn add_product(&self, name: &str, category: Category, price_cents: i64) -> Product {
    let mut products = self.products.write().await;
    let created_at = products
      .last()
      .map(|p| p.created_at + Duration::milliseconds(1))
      .unwrap_or_else(Utc::now);
    let product = Product {
      id: Uuid::new_v4(),
      name: name.to_string(),
      description: None,
      price_cents,
      category: category.as_str().to_string(),
      quantity: 1,
      units: "serving".to_string(),
      created_at,
      updated_at: created_at,
    };
    products.push(product.clone());
    product
  }

  /// Changes a catalog price. Lines already added keep the price they captured.
  pub async fn set_price(&self, product_id: Uuid, price_cents: i64) -> bool {
    let mut products = self.products.write().await;
    match products.iter_mut().find(|p| p.id == product_id) {
      Some(product) => {
        product.price_cents = price_cents;
        product.updated_at = Utc::now();
        true
      }
      None => false,
    }
  }

  pub async fn find_by_name(&self, name: &str) -> Option<Product> {
    self.products.read().await.iter().find(|p| p.name == name).cloned()
  }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
  async fn search(&self, filter: &MenuFilter) -> Result<Vec<Product>> {
    let products = self.products.read().await;
    Ok(products.iter().filter(|p| filter.matches(p)).cloned().collect())
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.products.read().await.iter().find(|p| p.id == product_id).cloned())
  }

  async fn products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>> {
    let products = self.products.read().await;
    Ok(products.iter().filter(|p| product_ids.contains(&p.id)).cloned().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn second_order_for_conversation_conflicts() {
    let store = InMemoryOrderStore::new();
    let conversation_id = Uuid::new_v4();
    let new_order = NewOrder {
      user_id: Uuid::new_v4(),
      conversation_id,
    };
    store.insert_order(new_order.clone()).await.unwrap();
    let err = store.insert_order(new_order).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
  }

  #[tokio::test]
  async fn paid_status_is_sticky() {
    let store = InMemoryOrderStore::new();
    let order = store
      .insert_order(NewOrder {
        user_id: Uuid::new_v4(),
        conversation_id: Uuid::new_v4(),
      })
      .await
      .unwrap();
    store.set_status(order.id, OrderStatus::Paid).await.unwrap();
    let after = store.set_status(order.id, OrderStatus::Submitted).await.unwrap().unwrap();
    assert_eq!(after.status, OrderStatus::Paid);
    assert!(store.set_status(Uuid::new_v4(), OrderStatus::Paid).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn deleting_order_cascades_to_lines() {
    let store = InMemoryOrderStore::new();
    let order = store
      .insert_order(NewOrder {
        user_id: Uuid::new_v4(),
        conversation_id: Uuid::new_v4(),
      })
      .await
      .unwrap();
    for _ in 0..2 {
      store
        .insert_line(NewOrderLine {
          order_id: order.id,
          product_id: Uuid::new_v4(),
          quantity: 1,
          unit_price_cents: 500,
          modifications: None,
        })
        .await
        .unwrap();
    }
    assert_eq!(store.line_count().await, 2);
    store.delete_order(order.id).await.unwrap();
    assert_eq!(store.line_count().await, 0);
    assert!(store.find_order_by_conversation(order.conversation_id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn catalog_search_keeps_catalog_order() {
    let catalog = InMemoryCatalog::with_demo_menu();
    let hits = catalog
      .search(&MenuFilter::from_loose(None, None, None, Some("flatbread")))
      .await
      .unwrap();
    let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Chicken Flatbread", "Margherita Flatbread"]);
  }
}

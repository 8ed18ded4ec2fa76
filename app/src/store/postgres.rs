// chat_orders/src/store/postgres.rs

use super::{Catalog, OrderStore};
use crate::errors::{AppError, Result};
use crate::models::{MenuFilter, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, Product};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, conversation_id, status, created_at, updated_at";
const LINE_COLUMNS: &str =
  "id, order_id, product_id, quantity, unit_price_cents, modifications, created_at, updated_at";
const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, category, quantity, units, created_at, updated_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Escapes `%`, `_` and `\` so user input is matched literally inside `ILIKE`.
fn like_pattern(raw: &str) -> String {
  let mut escaped = String::with_capacity(raw.len() + 2);
  escaped.push('%');
  for ch in raw.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped.push('%');
  escaped
}

#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(&self.pool).await?)
  }

  async fn find_order_by_conversation(&self, conversation_id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE conversation_id = $1", ORDER_COLUMNS);
    Ok(
      sqlx::query_as::<_, Order>(&sql)
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  #[instrument(name = "PgOrderStore::insert_order", skip(self), fields(conversation_id = %new_order.conversation_id))]
  async fn insert_order(&self, new_order: NewOrder) -> Result<Order> {
    let sql = format!(
      "INSERT INTO orders (id, user_id, conversation_id, status) VALUES ($1, $2, $3, 'pending') RETURNING {}",
      ORDER_COLUMNS
    );
    sqlx::query_as::<_, Order>(&sql)
      .bind(Uuid::new_v4())
      .bind(new_order.user_id)
      .bind(new_order.conversation_id)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          AppError::Conflict(format!("conversation {} already has an order", new_order.conversation_id))
        } else {
          AppError::Sqlx(e)
        }
      })
  }

  #[instrument(name = "PgOrderStore::set_status", skip(self))]
  async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
    let sql = format!(
      "UPDATE orders SET status = CASE WHEN status = 'paid' THEN status ELSE $2 END, updated_at = now() \
       WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn insert_line(&self, new_line: NewOrderLine) -> Result<OrderLine> {
    let sql = format!(
      "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, modifications) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      LINE_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, OrderLine>(&sql)
        .bind(Uuid::new_v4())
        .bind(new_line.order_id)
        .bind(new_line.product_id)
        .bind(new_line.quantity)
        .bind(new_line.unit_price_cents)
        .bind(new_line.modifications.map(Json))
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn find_line(&self, line_id: Uuid) -> Result<Option<OrderLine>> {
    let sql = format!("SELECT {} FROM order_items WHERE id = $1", LINE_COLUMNS);
    Ok(sqlx::query_as::<_, OrderLine>(&sql).bind(line_id).fetch_optional(&self.pool).await?)
  }

  async fn delete_line(&self, line_id: Uuid) -> Result<Option<OrderLine>> {
    let sql = format!("DELETE FROM order_items WHERE id = $1 RETURNING {}", LINE_COLUMNS);
    Ok(sqlx::query_as::<_, OrderLine>(&sql).bind(line_id).fetch_optional(&self.pool).await?)
  }

  async fn lines_for_order(&self, order_id: Uuid) -> Result<Vec<OrderLine>> {
    let sql = format!(
      "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY created_at, id",
      LINE_COLUMNS
    );
    Ok(sqlx::query_as::<_, OrderLine>(&sql).bind(order_id).fetch_all(&self.pool).await?)
  }

  async fn orders_for_user(&self, user_id: Uuid, status: Option<OrderStatus>) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2) \
       ORDER BY created_at DESC, id",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?,
    )
  }
}

#[derive(Clone)]
pub struct PgCatalog {
  pool: PgPool,
}

impl PgCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl Catalog for PgCatalog {
  #[instrument(name = "PgCatalog::search", skip(self))]
  async fn search(&self, filter: &MenuFilter) -> Result<Vec<Product>> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));
    if let Some(category) = filter.category {
      qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(min) = filter.min_price_cents {
      qb.push(" AND price_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price_cents {
      qb.push(" AND price_cents <= ").push_bind(max);
    }
    if let Some(name) = &filter.name {
      qb.push(" AND name ILIKE ").push_bind(like_pattern(name));
    }
    qb.push(" ORDER BY created_at, id");
    Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).bind(product_id).fetch_optional(&self.pool).await?)
  }

  async fn products_by_ids(&self, product_ids: &[Uuid]) -> Result<Vec<Product>> {
    if product_ids.is_empty() {
      return Ok(Vec::new());
    }
    let sql = format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS);
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?,
    )
  }
}

/// Inserts a small demo menu when the catalog is empty.
#[instrument(name = "seed_catalog", skip(pool))]
pub async fn seed_catalog(pool: &PgPool) -> Result<u64> {
  let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(pool).await?;
  if existing > 0 {
    tracing::info!(existing, "Catalog already populated, skipping seed.");
    return Ok(0);
  }

  let mut inserted = 0;
  for (name, description, price_cents, category, quantity, units) in super::in_memory::DEMO_MENU {
    sqlx::query(
      "INSERT INTO products (id, name, description, price_cents, category, quantity, units) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .bind(price_cents)
    .bind(category.as_str())
    .bind(quantity)
    .bind(units)
    .execute(pool)
    .await?;
    inserted += 1;
  }
  tracing::info!(inserted, "Demo catalog seeded.");
  Ok(inserted)
}

#[cfg(test)]
mod tests {
  use super::like_pattern;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("egg"), "%egg%");
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
  }
}

// chat_orders/src/services/cart_service.rs

//! Order creation and line mutation. Every write is a single store call; the only
//! coordination is the one-order-per-conversation constraint enforced by the store.

use crate::errors::{AppError, Result};
use crate::models::{Modifications, NewOrder, NewOrderLine, Order, OrderLine, OrderLineDetail, OrderStatus, OrderWithLines};
use crate::store::{Catalog, OrderStore};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Returns the conversation's order, creating a pending one on first use.
///
/// Two callers racing on the first mutation both try the insert; the loser sees
/// `AppError::Conflict` and re-reads the winner's row.
#[instrument(name = "cart::get_or_create_order", skip(store))]
pub async fn get_or_create_order(store: &dyn OrderStore, conversation_id: Uuid, user_id: Uuid) -> Result<Order> {
  let order = match store.find_order_by_conversation(conversation_id).await? {
    Some(existing) => existing,
    None => match store.insert_order(NewOrder { user_id, conversation_id }).await {
      Ok(created) => {
        info!(order_id = %created.id, "Created pending order for conversation.");
        created
      }
      Err(AppError::Conflict(_)) => {
        info!("Lost order creation race, reading existing order.");
        store
          .find_order_by_conversation(conversation_id)
          .await?
          .ok_or_else(|| AppError::Internal(format!("order for conversation {} vanished after conflict", conversation_id)))?
      }
      Err(e) => return Err(e),
    },
  };

  if order.user_id != user_id {
    warn!(order_id = %order.id, owner = %order.user_id, "Conversation order belongs to another user.");
    return Err(AppError::Forbidden("This conversation's order belongs to another user".to_string()));
  }
  Ok(order)
}

/// Adds a new line priced at the product's current catalog price.
#[instrument(name = "cart::add_item", skip(store, catalog, modifications))]
pub async fn add_item(
  store: &dyn OrderStore,
  catalog: &dyn Catalog,
  order_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  modifications: Option<Modifications>,
) -> Result<OrderLine> {
  if quantity < 1 {
    return Err(AppError::Validation("Quantity must be at least 1".to_string()));
  }
  let order = store
    .find_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
  if !order.status.is_editable() {
    return Err(AppError::InvalidState(format!(
      "Order {} is {} and can no longer be changed",
      order_id, order.status
    )));
  }
  let product = catalog
    .get_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

  let line = store
    .insert_line(NewOrderLine {
      order_id,
      product_id,
      quantity,
      unit_price_cents: product.price_cents,
      modifications,
    })
    .await?;
  info!(line_id = %line.id, unit_price_cents = line.unit_price_cents, "Line added.");
  Ok(line)
}

/// Deletes a line the caller owns from an order that is still pending.
#[instrument(name = "cart::remove_item", skip(store))]
pub async fn remove_item(store: &dyn OrderStore, order_item_id: Uuid, user_id: Uuid) -> Result<OrderLine> {
  let line = store
    .find_line(order_item_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order item {} not found", order_item_id)))?;
  let order = store
    .find_order(line.order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", line.order_id)))?;

  if order.user_id != user_id {
    warn!(order_id = %order.id, "Remove attempted on another user's order.");
    return Err(AppError::Forbidden("You do not own this order item".to_string()));
  }
  if matches!(order.status, OrderStatus::Submitted | OrderStatus::Paid) {
    return Err(AppError::InvalidState(format!(
      "Order {} is {} and can no longer be changed",
      order.id, order.status
    )));
  }

  let removed = store
    .delete_line(order_item_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order item {} not found", order_item_id)))?;
  info!(order_id = %order.id, "Line removed.");
  Ok(removed)
}

/// Joins an order's lines with product names. Lines whose product left the catalog keep
/// their price and show as an unknown item.
pub async fn load_order_with_lines(store: &dyn OrderStore, catalog: &dyn Catalog, order: Order) -> Result<OrderWithLines> {
  let lines = store.lines_for_order(order.id).await?;
  let mut product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
  product_ids.sort();
  product_ids.dedup();
  let products: HashMap<Uuid, _> = catalog
    .products_by_ids(&product_ids)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  let lines = lines
    .into_iter()
    .map(|line| {
      let product = products.get(&line.product_id);
      OrderLineDetail {
        product_name: product.map(|p| p.name.clone()).unwrap_or_else(|| "Unknown item".to_string()),
        product_description: product.and_then(|p| p.description.clone()),
        line,
      }
    })
    .collect();
  Ok(OrderWithLines { order, lines })
}

pub async fn order_for_conversation(
  store: &dyn OrderStore,
  catalog: &dyn Catalog,
  conversation_id: Uuid,
) -> Result<Option<OrderWithLines>> {
  match store.find_order_by_conversation(conversation_id).await? {
    Some(order) => Ok(Some(load_order_with_lines(store, catalog, order).await?)),
    None => Ok(None),
  }
}

pub async fn orders_for_user(
  store: &dyn OrderStore,
  catalog: &dyn Catalog,
  user_id: Uuid,
  status: Option<OrderStatus>,
) -> Result<Vec<OrderWithLines>> {
  let orders = store.orders_for_user(user_id, status).await?;
  let mut out = Vec::with_capacity(orders.len());
  for order in orders {
    out.push(load_order_with_lines(store, catalog, order).await?);
  }
  Ok(out)
}

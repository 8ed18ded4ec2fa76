// tests/order_flow_tests.rs

mod common;

use chat_orders::errors::AppError;
use chat_orders::models::OrderStatus;
use chat_orders::services::cart_service;
use chat_orders::store::OrderStore;
use chat_orders::tools;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_mutations_share_one_order() {
  let app = common::build();
  let store: Arc<dyn OrderStore> = app.store.clone();
  let (conversation_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());

  let handles: Vec<_> = (0..16)
    .map(|_| {
      let store = store.clone();
      tokio::spawn(async move { cart_service::get_or_create_order(store.as_ref(), conversation_id, user_id).await })
    })
    .collect();

  let mut ids = HashSet::new();
  for handle in handles {
    ids.insert(handle.await.unwrap().unwrap().id);
  }
  assert_eq!(ids.len(), 1);
  assert_eq!(store.orders_for_user(user_id, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn conversation_order_is_not_shared_across_users() {
  let app = common::build();
  let conversation_id = Uuid::new_v4();
  cart_service::get_or_create_order(app.store.as_ref(), conversation_id, Uuid::new_v4())
    .await
    .unwrap();

  let res = cart_service::get_or_create_order(app.store.as_ref(), conversation_id, Uuid::new_v4()).await;
  assert!(matches!(res, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn non_positive_quantities_are_rejected() {
  let app = common::build();
  let product = app.catalog.find_by_name("Egg Sandwich").await.unwrap();
  let order = cart_service::get_or_create_order(app.store.as_ref(), Uuid::new_v4(), Uuid::new_v4())
    .await
    .unwrap();

  for quantity in [0, -3] {
    let res = cart_service::add_item(app.store.as_ref(), app.catalog.as_ref(), order.id, product.id, quantity, None).await;
    assert!(matches!(res, Err(AppError::Validation(_))), "quantity {} accepted", quantity);
  }
  assert_eq!(app.store.line_count().await, 0);

  let ctx = common::tool_ctx(Uuid::new_v4(), Uuid::new_v4());
  let res = tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "Egg", "quantity": 0})).await;
  assert!(matches!(res, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn repeated_adds_create_separate_lines() {
  let app = common::build();
  let ctx = common::tool_ctx(Uuid::new_v4(), Uuid::new_v4());

  for _ in 0..2 {
    let text = tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "egg sandwich", "quantity": 2}))
      .await
      .unwrap();
    assert_eq!(text, "Added 2 x Egg Sandwich ($9.50 each) to your order.");
  }

  let order = app.store.find_order_by_conversation(ctx.conversation_id).await.unwrap().unwrap();
  let lines = app.store.lines_for_order(order.id).await.unwrap();
  assert_eq!(lines.len(), 2);
  assert_eq!(lines.iter().map(|l| l.quantity).sum::<i32>(), 4);
  assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn removing_another_users_line_is_forbidden() {
  let app = common::build();
  let owner = Uuid::new_v4();
  let ctx = common::tool_ctx(Uuid::new_v4(), owner);
  tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "Turkey", "quantity": 1}))
    .await
    .unwrap();
  let order = app.store.find_order_by_conversation(ctx.conversation_id).await.unwrap().unwrap();
  let line = app.store.lines_for_order(order.id).await.unwrap().remove(0);

  let res = cart_service::remove_item(app.store.as_ref(), line.id, Uuid::new_v4()).await;
  assert!(matches!(res, Err(AppError::Forbidden(_))));
  assert!(app.store.find_line(line.id).await.unwrap().is_some());

  cart_service::remove_item(app.store.as_ref(), line.id, owner).await.unwrap();
  assert!(app.store.find_line(line.id).await.unwrap().is_none());
}

#[tokio::test]
async fn lines_keep_the_price_they_were_added_at() {
  let app = common::build();
  let ctx = common::tool_ctx(Uuid::new_v4(), Uuid::new_v4());
  let cookie = app.catalog.find_by_name("Chocolate Chip Cookie").await.unwrap();

  tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "cookie", "quantity": 3}))
    .await
    .unwrap();
  assert!(app.catalog.set_price(cookie.id, 500).await);

  let order = cart_service::order_for_conversation(app.store.as_ref(), app.catalog.as_ref(), ctx.conversation_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(order.lines[0].line.unit_price_cents, 350);
  assert_eq!(order.total_cents(), 1050);
}

#[tokio::test]
async fn tool_misses_are_reported_as_text() {
  let app = common::build();
  let ctx = common::tool_ctx(Uuid::new_v4(), Uuid::new_v4());

  let text = tools::execute(&app.state, &ctx, "removeItemFromOrder", json!({"productName": "Salmon"}))
    .await
    .unwrap();
  assert_eq!(text, "There are no items in your order yet.");

  let text = tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "Lobster", "quantity": 1}))
    .await
    .unwrap();
  assert_eq!(text, "Sorry, I couldn't find a menu item matching \"Lobster\".");
  assert!(app.store.find_order_by_conversation(ctx.conversation_id).await.unwrap().is_none());

  tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "Salmon", "quantity": 1}))
    .await
    .unwrap();
  let text = tools::execute(&app.state, &ctx, "removeItemFromOrder", json!({"productName": "Burrito"}))
    .await
    .unwrap();
  assert_eq!(text, "I couldn't find \"Burrito\" in your order.");

  let text = tools::execute(&app.state, &ctx, "removeItemFromOrder", json!({"productName": "salmon"}))
    .await
    .unwrap();
  assert_eq!(text, "Removed Salmon Bowl from your order.");
}

#[tokio::test]
async fn submitted_orders_reject_tool_edits_with_text() {
  let app = common::build();
  let ctx = common::tool_ctx(Uuid::new_v4(), Uuid::new_v4());
  tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "Oats", "quantity": 1}))
    .await
    .unwrap();
  let order = app.store.find_order_by_conversation(ctx.conversation_id).await.unwrap().unwrap();
  app.store.set_status(order.id, OrderStatus::Submitted).await.unwrap();

  let text = tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "Oats", "quantity": 1}))
    .await
    .unwrap();
  assert_eq!(text, "Your order has already been submitted and can no longer be changed.");
  assert_eq!(app.store.lines_for_order(order.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn menu_query_filters_and_formats() {
  let app = common::build();
  let ctx = common::tool_ctx(Uuid::new_v4(), Uuid::new_v4());

  let text = tools::execute(&app.state, &ctx, "menuQuery", json!({"category": "flatbread"})).await.unwrap();
  assert_eq!(
    text,
    "* Chicken Flatbread ($13.00): 1 flatbread — Roast chicken, pesto, mozzarella\n\
     * Margherita Flatbread ($11.50): 1 flatbread — Tomato, basil, fresh mozzarella"
  );

  let text = tools::execute(&app.state, &ctx, "menuQuery", json!({"maxPrice": 7, "category": "soup"})).await.unwrap();
  assert!(text.contains("* Overnight Oats ($6.50): 12 oz"));
  assert!(text.contains("* Chocolate Chip Cookie ($3.50): 2 cookies"));
  assert_eq!(text.lines().count(), 2);

  let text = tools::execute(&app.state, &ctx, "menuQuery", json!({"name": "pizza"})).await.unwrap();
  assert_eq!(text, "No menu items found matching your criteria.");
}

#[tokio::test]
async fn unknown_tools_and_bad_arguments_are_errors() {
  let app = common::build();
  let ctx = common::tool_ctx(Uuid::new_v4(), Uuid::new_v4());

  let res = tools::execute(&app.state, &ctx, "placeOrder", json!({})).await;
  assert!(matches!(res, Err(AppError::NotFound(_))));

  let res = tools::execute(&app.state, &ctx, "addItemToOrder", json!({"productName": "Egg", "quantity": 1, "extra": true})).await;
  assert!(matches!(res, Err(AppError::Validation(_))));

  let res = tools::execute(&app.state, &ctx, "removeItemFromOrder", json!({"productName": "  "})).await;
  assert!(matches!(res, Err(AppError::Validation(_))));
}

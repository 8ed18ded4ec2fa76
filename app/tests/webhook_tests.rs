// tests/webhook_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chat_orders::models::OrderStatus;
use chat_orders::services::{cart_service, signature};
use chat_orders::store::OrderStore;
use chat_orders::tools;
use chat_orders::web::configure_app_routes;
use serde_json::{json, Value};
use uuid::Uuid;

macro_rules! init_app {
  ($app:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($app.state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn webhook_request(body: Vec<u8>, header: Option<String>) -> test::TestRequest {
  let mut req = test::TestRequest::post()
    .uri("/api/v1/webhooks/payments")
    .insert_header(("content-type", "application/json"));
  if let Some(header) = header {
    req = req.insert_header(("stripe-signature", header));
  }
  req.set_payload(body)
}

async fn submitted_order(app: &common::TestApp) -> Uuid {
  let order = cart_service::get_or_create_order(app.store.as_ref(), Uuid::new_v4(), Uuid::new_v4())
    .await
    .unwrap();
  app.store.set_status(order.id, OrderStatus::Submitted).await.unwrap();
  order.id
}

#[actix_web::test]
async fn repeated_success_events_settle_on_paid() {
  let app = common::build();
  let svc = init_app!(app);
  let order_id = submitted_order(&app).await;
  let (body, header) = common::signed(&common::payment_event("checkout.session.completed", Some(order_id)));

  for _ in 0..3 {
    let res: Value = test::call_and_read_body_json(&svc, webhook_request(body.clone(), Some(header.clone())).to_request()).await;
    assert_eq!(res, json!({"received": true}));
    assert_eq!(common::order_status(&app, order_id).await, OrderStatus::Paid);
  }
}

#[actix_web::test]
async fn success_event_pays_a_pending_order() {
  let app = common::build();
  let svc = init_app!(app);
  let order = cart_service::get_or_create_order(app.store.as_ref(), Uuid::new_v4(), Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(order.status, OrderStatus::Pending);

  let (body, header) = common::signed(&common::payment_event("checkout.session.completed", Some(order.id)));
  let res: Value = test::call_and_read_body_json(&svc, webhook_request(body, Some(header)).to_request()).await;
  assert_eq!(res, json!({"received": true}));
  assert_eq!(common::order_status(&app, order.id).await, OrderStatus::Paid);
}

#[actix_web::test]
async fn failed_payment_keeps_order_submitted() {
  let app = common::build();
  let svc = init_app!(app);
  let order_id = submitted_order(&app).await;
  let (body, header) = common::signed(&common::payment_event("payment_intent.payment_failed", Some(order_id)));

  let res = test::call_service(&svc, webhook_request(body, Some(header)).to_request()).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(common::order_status(&app, order_id).await, OrderStatus::Submitted);
}

#[actix_web::test]
async fn late_failure_does_not_unpay_an_order() {
  let app = common::build();
  let svc = init_app!(app);
  let order_id = submitted_order(&app).await;

  let (body, header) = common::signed(&common::payment_event("checkout.session.completed", Some(order_id)));
  test::call_service(&svc, webhook_request(body, Some(header)).to_request()).await;
  let (body, header) = common::signed(&common::payment_event("payment_intent.payment_failed", Some(order_id)));
  test::call_service(&svc, webhook_request(body, Some(header)).to_request()).await;

  assert_eq!(common::order_status(&app, order_id).await, OrderStatus::Paid);
}

#[actix_web::test]
async fn unauthentic_events_are_rejected_without_changes() {
  let app = common::build();
  let svc = init_app!(app);
  let order_id = submitted_order(&app).await;
  let body = serde_json::to_vec(&common::payment_event("checkout.session.completed", Some(order_id))).unwrap();
  let now = chrono::Utc::now().timestamp();

  let forged = signature::sign(&body, "whsec_wrong", now).unwrap();
  let stale = signature::sign(&body, common::WEBHOOK_SECRET, now - 3600).unwrap();
  for header in [Some(forged), Some(stale), Some("garbage".to_string()), None] {
    let res = test::call_service(&svc, webhook_request(body.clone(), header).to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error: Value = test::read_body_json(res).await;
    assert_eq!(error, json!({"error": "Webhook signature verification failed"}));
  }
  assert_eq!(common::order_status(&app, order_id).await, OrderStatus::Submitted);
}

#[actix_web::test]
async fn unrelated_or_unmatched_events_are_acknowledged() {
  let app = common::build();
  let svc = init_app!(app);
  let order_id = submitted_order(&app).await;

  let events = [
    common::payment_event("customer.created", Some(order_id)),
    common::payment_event("checkout.session.completed", None),
    common::payment_event("checkout.session.completed", Some(Uuid::new_v4())),
    json!({"id": "evt_x", "type": "checkout.session.completed", "data": {"object": {"metadata": {"orderId": "not-a-uuid"}}}}),
  ];
  for event in events {
    let (body, header) = common::signed(&event);
    let res = test::call_service(&svc, webhook_request(body, Some(header)).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
  }
  assert_eq!(common::order_status(&app, order_id).await, OrderStatus::Submitted);
}

#[actix_web::test]
async fn authentic_but_malformed_payload_is_a_bad_request() {
  let app = common::build();
  let svc = init_app!(app);
  let body = b"{not json".to_vec();
  let header = signature::sign(&body, common::WEBHOOK_SECRET, chrono::Utc::now().timestamp()).unwrap();

  let res = test::call_service(&svc, webhook_request(body, Some(header)).to_request()).await;
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

/// One conversation from first add to a repeated payment confirmation.
#[actix_web::test]
async fn conversation_to_paid_walkthrough() {
  let app = common::build();
  let svc = init_app!(app);
  let (c1, u1, u2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  let egg_price = app.catalog.find_by_name("Egg Sandwich").await.unwrap().price_cents;

  let text = tools::execute(&app.state, &common::tool_ctx(c1, u1), "addItemToOrder", json!({"productName": "Egg Sandwich", "quantity": 2}))
    .await
    .unwrap();
  assert!(text.starts_with("Added 2 x Egg Sandwich"));
  let order = app.store.find_order_by_conversation(c1).await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
  let l1 = app.store.lines_for_order(order.id).await.unwrap().remove(0);
  assert_eq!((l1.quantity, l1.unit_price_cents), (2, egg_price));

  let req = test::TestRequest::delete()
    .uri("/api/v1/orders/items")
    .insert_header(("X-User-ID", u2.to_string()))
    .set_json(json!({"orderItemId": l1.id}))
    .to_request();
  assert_eq!(test::call_service(&svc, req).await.status(), StatusCode::FORBIDDEN);
  assert!(app.store.find_line(l1.id).await.unwrap().is_some());

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(("X-User-ID", u1.to_string()))
    .set_json(json!({"orderId": order.id}))
    .to_request();
  let session: Value = test::call_and_read_body_json(&svc, req).await;
  assert!(session["sessionId"].is_string());
  assert_eq!(common::order_status(&app, order.id).await, OrderStatus::Submitted);
  let requests = app.payments.requests().await;
  assert_eq!(requests[0].line_items.len(), 1);
  assert_eq!(requests[0].line_items[0].quantity, 2);

  let (body, header) = common::signed(&common::payment_event("checkout.session.completed", Some(order.id)));
  for _ in 0..2 {
    let res = test::call_service(&svc, webhook_request(body.clone(), Some(header.clone())).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(common::order_status(&app, order.id).await, OrderStatus::Paid);
  }
}

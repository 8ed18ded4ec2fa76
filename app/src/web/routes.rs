// chat_orders/src/web/routes.rs

use crate::web::handlers::{
  checkout_handlers, menu_handlers, order_handlers, tool_handlers, webhook_handlers,
};
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route("/tools", web::get().to(tool_handlers::list_tools_handler))
      .route(
        "/conversations/{conversation_id}/tools/{tool_name}",
        web::post().to(tool_handlers::run_tool_handler),
      )
      .route("/menu", web::get().to(menu_handlers::list_menu_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::conversation_order_handler))
          .route("", web::patch().to(order_handlers::update_order_status_handler))
          .route("/mine", web::get().to(order_handlers::my_orders_handler))
          .route("/items", web::delete().to(order_handlers::remove_order_line_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::start_checkout_handler))
      .route(
        "/webhooks/payments",
        web::post().to(webhook_handlers::payment_webhook_handler),
      ),
  );
}

// chat_orders/src/web/handlers/mod.rs

pub mod checkout_handlers;
pub mod extractors;
pub mod menu_handlers;
pub mod order_handlers;
pub mod tool_handlers;
pub mod webhook_handlers;

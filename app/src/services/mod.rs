// chat_orders/src/services/mod.rs

pub mod cart_service;
pub mod notifier;
pub mod payment;
pub mod signature;

// chat_orders/src/lib.rs

//! Conversational food ordering: an agent-facing tool layer over a per-conversation order,
//! hosted checkout, and payment webhook reconciliation.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod tools;
pub mod web;

pub use crate::config::AppConfig;
pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;

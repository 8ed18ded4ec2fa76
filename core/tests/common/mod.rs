// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use stepflow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// A toy ticket that steps append to, enough to observe ordering and short-circuits.
#[derive(Clone, Debug, Default)]
pub struct TicketContext {
  pub total_cents: i64,
  pub lines: Vec<String>,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TicketError {
  #[error("engine: {0}")]
  Engine(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TicketError {
  fn from(e: FlowError) -> Self {
    TicketError::Engine(format!("{:?}", e))
  }
}

/// Appends `line` priced at `cents`, records the step, and stops if `stop_at` names it.
pub fn add_line_handler(step_name: &'static str, line: &'static str, cents: i64) -> stepflow::Handler<TicketContext, TicketError> {
  Box::new(move |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.total_cents += cents;
      guard.lines.push(line.to_string());
      guard.trail.push(step_name.to_string());
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> stepflow::Handler<TicketContext, TicketError> {
  Box::new(move |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      ctx.write().trail.push(step_name.to_string());
      Err(TicketError::Step(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

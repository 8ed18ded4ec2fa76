// stepflow/examples/cart_totals.rs

//! Prices a small cart through a three-step pipeline, dispatched through a registry.

use std::sync::Arc;
use stepflow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
use tracing::info;

#[derive(Clone, Debug, Default)]
struct CartTotals {
  lines: Vec<(String, i64, i32)>,
  subtotal_cents: i64,
  discount_cents: i64,
  receipt: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let mut pipeline = Pipeline::<CartTotals, FlowError>::new(&[
    ("sum_lines", false, None),
    (
      "bulk_discount",
      true,
      Some(Arc::new(|ctx: ContextData<CartTotals>| ctx.read().subtotal_cents < 2000)),
    ),
    ("print_receipt", false, None),
  ]);

  pipeline.on_root("sum_lines", |ctx: ContextData<CartTotals>| {
    Box::pin(async move {
      let mut data = ctx.write();
      data.subtotal_cents = data.lines.iter().map(|(_, cents, qty)| cents * i64::from(*qty)).sum();
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  pipeline.on_root("bulk_discount", |ctx: ContextData<CartTotals>| {
    Box::pin(async move {
      let mut data = ctx.write();
      data.discount_cents = data.subtotal_cents / 10;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  pipeline.on_root("print_receipt", |ctx: ContextData<CartTotals>| {
    Box::pin(async move {
      let mut data = ctx.write();
      let lines: Vec<String> = data
        .lines
        .iter()
        .map(|(name, cents, qty)| format!("{} x{} @ {}", name, qty, cents))
        .collect();
      data.receipt = lines;
      let total = data.subtotal_cents - data.discount_cents;
      data.receipt.push(format!("total {}", total));
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });

  let registry = FlowRegistry::<FlowError>::new();
  registry.register_pipeline(pipeline);

  let cart = ContextData::new(CartTotals {
    lines: vec![("Egg Sandwich".to_string(), 950, 2), ("Cookie".to_string(), 350, 1)],
    ..Default::default()
  });
  let result = registry.run(cart.clone()).await?;
  assert_eq!(result, PipelineResult::Completed);

  let data = cart.read();
  for line in &data.receipt {
    info!("{}", line);
  }
  // 2250 subtotal crosses the discount threshold.
  assert_eq!(data.discount_cents, 225);
  Ok(())
}

// benches/pipeline_benchmarks.rs
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use stepflow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, SkipCondition};
use tokio::runtime::Runtime;

#[derive(Debug, Default)]
struct CartTotals {
  subtotal_cents: i64,
  lines: u64,
}

fn price_line_handler(unit_cents: i64) -> stepflow::Handler<CartTotals, FlowError> {
  Box::new(move |ctx: ContextData<CartTotals>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.subtotal_cents += unit_cents;
      guard.lines += 1;
      Ok(PipelineControl::Continue)
    })
  })
}

fn build_pipeline(num_steps: usize, skip_every_other: bool) -> Pipeline<CartTotals, FlowError> {
  let names: Vec<String> = (0..num_steps).map(|i| format!("line_{}", i)).collect();
  let step_defs: Vec<(&str, bool, Option<SkipCondition<CartTotals>>)> = names
    .iter()
    .enumerate()
    .map(|(i, name)| {
      let skip: Option<SkipCondition<CartTotals>> = if skip_every_other && i % 2 == 1 {
        Some(Arc::new(|ctx: ContextData<CartTotals>| ctx.read().lines % 2 == 1))
      } else {
        None
      };
      (name.as_str(), false, skip)
    })
    .collect();

  let mut pipeline = Pipeline::<CartTotals, FlowError>::new(&step_defs);
  for name in &names {
    pipeline.on_root(name, price_line_handler(1250));
  }
  pipeline
}

fn bench_direct_run(c: &mut Criterion) {
  let mut group = c.benchmark_group("DirectRun");
  let rt = Runtime::new().expect("tokio runtime");

  for num_steps in [1usize, 5, 20] {
    for skip in [false, true] {
      let pipeline = Arc::new(build_pipeline(num_steps, skip));
      group.throughput(Throughput::Elements(num_steps as u64));
      group.bench_with_input(
        BenchmarkId::new(if skip { "with_skips" } else { "no_skips" }, num_steps),
        &num_steps,
        |b, _| {
          b.to_async(&rt).iter_batched(
            || ContextData::new(CartTotals::default()),
            |ctx| {
              let p = pipeline.clone();
              async move { p.run(ctx).await.expect("run") }
            },
            criterion::BatchSize::SmallInput,
          );
        },
      );
    }
  }
  group.finish();
}

fn bench_registry_dispatch(c: &mut Criterion) {
  let mut group = c.benchmark_group("RegistryDispatch");
  let rt = Runtime::new().expect("tokio runtime");

  let registry = Arc::new(FlowRegistry::<FlowError>::new());
  registry.register_pipeline(build_pipeline(5, false));

  group.bench_function("five_steps", |b| {
    b.to_async(&rt).iter_batched(
      || ContextData::new(CartTotals::default()),
      |ctx| {
        let r = registry.clone();
        async move { r.run(ctx).await.expect("run") }
      },
      criterion::BatchSize::SmallInput,
    );
  });
  group.finish();
}

criterion_group!(benches, bench_direct_run, bench_registry_dispatch);
criterion_main!(benches);

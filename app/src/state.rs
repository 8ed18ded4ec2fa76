// chat_orders/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::notifier::Notifier;
use crate::services::payment::PaymentProcessor;
use crate::store::{Catalog, OrderStore};
use std::sync::Arc;
use stepflow::FlowRegistry;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub catalog: Arc<dyn Catalog>,
  pub payments: Arc<dyn PaymentProcessor>,
  pub notifier: Arc<dyn Notifier>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the adapters together and registers every pipeline.
  pub fn new(
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn Catalog>,
    payments: Arc<dyn PaymentProcessor>,
    notifier: Arc<dyn Notifier>,
    config: Arc<AppConfig>,
  ) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);
    Self {
      store,
      catalog,
      payments,
      notifier,
      flows,
      config,
    }
  }
}

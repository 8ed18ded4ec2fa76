// chat_orders/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use chat_orders::config::{AppConfig, LogFormat};
use chat_orders::services::notifier::{MockEmailNotifier, Notifier};
use chat_orders::services::payment::{MockPaymentProcessor, PaymentProcessor, StripeCheckoutClient};
use chat_orders::state::AppState;
use chat_orders::store::{postgres, PgCatalog, PgOrderStore};
use chat_orders::web::configure_app_routes;
use sqlx::PgPool;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
  tracing::error!(error = %err, "{}", context);
  io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(config = ?app_config, "Starting chat ordering server...");

  let db_pool = PgPool::connect(&app_config.database_url)
    .await
    .map_err(|e| startup_error("Failed to connect to the database", e))?;
  tracing::info!("Connected to the database.");

  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .map_err(|e| startup_error("Failed to apply migrations", e))?;

  if app_config.seed_db {
    let inserted = postgres::seed_catalog(&db_pool)
      .await
      .map_err(|e| startup_error("Failed to seed the catalog", e))?;
    tracing::info!(inserted, "Catalog seeding finished.");
  }

  let payments: Arc<dyn PaymentProcessor> = match app_config.stripe_secret_key.as_deref() {
    Some(key) => Arc::new(
      StripeCheckoutClient::new(app_config.stripe_api_base.clone(), key)
        .map_err(|e| startup_error("Failed to build the payment client", e))?,
    ),
    None => {
      tracing::warn!("STRIPE_SECRET_KEY not set; using the mock payment processor.");
      Arc::new(MockPaymentProcessor::new())
    }
  };
  let notifier: Arc<dyn Notifier> = Arc::new(MockEmailNotifier::new(app_config.email_sender.clone()));

  let app_state = AppState::new(
    Arc::new(PgOrderStore::new(db_pool.clone())),
    Arc::new(PgCatalog::new(db_pool)),
    payments,
    notifier,
    app_config.clone(),
  );

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

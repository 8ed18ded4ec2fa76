// chat_orders/src/web/handlers/menu_handlers.rs

use crate::errors::AppError;
use crate::models::MenuFilter;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuQueryParams {
  pub category: Option<String>,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  pub name: Option<String>,
}

#[instrument(name = "handler::list_menu", skip(app_state))]
pub async fn list_menu_handler(
  app_state: web::Data<AppState>,
  query: web::Query<MenuQueryParams>,
) -> Result<HttpResponse, AppError> {
  let filter = MenuFilter::from_loose(
    query.category.as_deref(),
    query.min_price,
    query.max_price,
    query.name.as_deref(),
  );
  let products = app_state.catalog.search(&filter).await?;
  Ok(HttpResponse::Ok().json(products))
}

// chat_orders/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub category: String,
  /// Portion size, read together with `units` ("1 sandwich", "12 oz").
  pub quantity: i32,
  pub units: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Breakfast,
  Entree,
  Sandwich,
  Flatbread,
  Dessert,
}

impl Category {
  pub const ALL: [Category; 5] = [
    Category::Breakfast,
    Category::Entree,
    Category::Sandwich,
    Category::Flatbread,
    Category::Dessert,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Category::Breakfast => "breakfast",
      Category::Entree => "entree",
      Category::Sandwich => "sandwich",
      Category::Flatbread => "flatbread",
      Category::Dessert => "dessert",
    }
  }

  /// `None` for anything outside the allow-list; callers drop the filter in that case.
  pub fn parse(raw: &str) -> Option<Category> {
    let needle = raw.trim().to_lowercase();
    Category::ALL.into_iter().find(|c| c.as_str() == needle)
  }
}

/// Catalog query. Every field narrows the result; an empty filter returns the whole menu.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuFilter {
  pub category: Option<Category>,
  pub min_price_cents: Option<i64>,
  pub max_price_cents: Option<i64>,
  /// Case-insensitive substring of the product name.
  pub name: Option<String>,
}

impl MenuFilter {
  /// Builds a filter from loosely-typed input. Unknown categories are dropped, prices are
  /// dollars and only count when positive, blank names are ignored.
  pub fn from_loose(category: Option<&str>, min_price: Option<f64>, max_price: Option<f64>, name: Option<&str>) -> Self {
    let to_cents = |dollars: Option<f64>| {
      dollars
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| (d * 100.0).round() as i64)
    };
    Self {
      category: category.and_then(Category::parse),
      min_price_cents: to_cents(min_price),
      max_price_cents: to_cents(max_price),
      name: name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
    }
  }

  pub fn matches(&self, product: &Product) -> bool {
    if let Some(category) = self.category {
      if product.category != category.as_str() {
        return false;
      }
    }
    if let Some(min) = self.min_price_cents {
      if product.price_cents < min {
        return false;
      }
    }
    if let Some(max) = self.max_price_cents {
      if product.price_cents > max {
        return false;
      }
    }
    if let Some(name) = &self.name {
      if !product.name.to_lowercase().contains(&name.to_lowercase()) {
        return false;
      }
    }
    true
  }
}

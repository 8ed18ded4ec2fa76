// chat_orders/src/web/handlers/extractors.rs

use crate::errors::AppError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";
pub const USER_NAME_HEADER: &str = "X-User-Name";

/// Identity supplied by the fronting session layer. `X-User-ID` is required; e-mail and
/// display name are optional and only used for confirmations and checkout prefill.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub email: Option<String>,
  pub name: Option<String>,
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
  req
    .headers()
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

impl AuthenticatedUser {
  fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
    let raw_id = header_value(req, USER_ID_HEADER).ok_or_else(|| {
      warn!("Request without {} header.", USER_ID_HEADER);
      AppError::Auth(format!("Missing {} header", USER_ID_HEADER))
    })?;
    let user_id = Uuid::parse_str(&raw_id).map_err(|_| {
      warn!("Request with malformed {} header.", USER_ID_HEADER);
      AppError::Auth(format!("Invalid {} header", USER_ID_HEADER))
    })?;
    Ok(Self {
      user_id,
      email: header_value(req, USER_EMAIL_HEADER),
      name: header_value(req, USER_NAME_HEADER),
    })
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Self::from_headers(req))
  }
}

// chat_orders/src/services/signature.rs

//! Payment webhook authenticity: `t=<unix>,v1=<hex>` headers carrying
//! HMAC-SHA256(secret, "<t>.<raw body>").

use crate::errors::{AppError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedHeader {
  timestamp: i64,
  signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<ParsedHeader> {
  let mut timestamp = None;
  let mut signatures = Vec::new();
  for part in header.split(',') {
    let Some((key, value)) = part.trim().split_once('=') else {
      continue;
    };
    match key {
      "t" => {
        timestamp = Some(
          value
            .parse::<i64>()
            .map_err(|_| AppError::Authenticity("signature header has a malformed timestamp".to_string()))?,
        )
      }
      // Unparseable candidates are skipped; another v1 entry may still match.
      "v1" => {
        if let Ok(bytes) = hex::decode(value) {
          signatures.push(bytes);
        }
      }
      _ => {}
    }
  }
  let timestamp = timestamp.ok_or_else(|| AppError::Authenticity("signature header has no timestamp".to_string()))?;
  if signatures.is_empty() {
    return Err(AppError::Authenticity("signature header has no v1 signature".to_string()));
  }
  Ok(ParsedHeader { timestamp, signatures })
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Config(format!("Invalid webhook secret: {}", e)))?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(mac)
}

/// Verifies `header` against `payload` before anything reads the body.
///
/// Accepts when any `v1` entry matches (constant-time) and the timestamp is within
/// `tolerance_secs` of `now_unix` in either direction.
pub fn verify(payload: &[u8], header: Option<&str>, secret: &str, tolerance_secs: i64, now_unix: i64) -> Result<()> {
  let header = header.ok_or_else(|| AppError::Authenticity("missing signature header".to_string()))?;
  let parsed = parse_header(header)?;

  if now_unix.abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
    return Err(AppError::Authenticity("signature timestamp outside tolerance".to_string()));
  }

  let base = mac_for(secret, parsed.timestamp, payload)?;
  let matched = parsed
    .signatures
    .iter()
    .any(|candidate| base.clone().verify_slice(candidate).is_ok());
  if !matched {
    return Err(AppError::Authenticity("no signature matched the payload".to_string()));
  }
  Ok(())
}

/// Produces a header value `verify` accepts. Used by tests and local tooling that replays
/// events.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
  let mac = mac_for(secret, timestamp, payload)?;
  Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
}

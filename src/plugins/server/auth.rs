use axum::{
  body::{Body, to_bytes},
  extract::{Request, State},
  middleware::Next,
  response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{prelude::*, state::AppState};

pub const SIGNATURE_HEADER: &str = "x-signature";

const MAX_BODY: usize = 1024 * 1024;

type HmacSha256 = Hmac<Sha256>;

/// Checks a hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
  let Ok(expected) = hex::decode(signature.trim()) else {
    return false;
  };
  let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
    return false;
  };
  mac.update(body);
  mac.verify_slice(&expected).is_ok()
}

/// Rejects `/api` requests whose body is not signed with the server secret.
pub async fn require_signature(
  State(app): State<Arc<AppState>>,
  request: Request,
  next: Next,
) -> Result<Response> {
  let (parts, body) = request.into_parts();

  let signature = parts
    .headers
    .get(SIGNATURE_HEADER)
    .and_then(|value| value.to_str().ok())
    .ok_or(Error::Unauthorized)?
    .to_owned();

  let bytes = to_bytes(body, MAX_BODY)
    .await
    .map_err(|_| Error::InvalidArgs("Request body too large".into()))?;

  if !verify_signature(&app.config.server_secret, &bytes, &signature) {
    warn!("Rejected {} {}: bad signature", parts.method, parts.uri);
    return Err(Error::Unauthorized);
  }

  Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

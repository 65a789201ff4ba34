//! The session resolver: request credentials → authenticated principal.
//!
//! Resolution goes to the store on every call. A session token presented by
//! a client is never trusted on its own — the hash must match a live row
//! and the row's expiry must still be in the future at resolution time.

use chrono::{Duration, Utc};
use lectern_core::{
  principal::{Principal, Session},
  store::PlatformStore,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  token::{generate_token, hash_token},
};

/// A freshly issued session: the raw token leaves the process exactly once,
/// in this struct.
#[derive(Debug, Clone)]
pub struct IssuedSession {
  pub token:   String,
  pub session: Session,
}

/// Issue a new session for `user_id`, valid for `ttl` from now.
pub async fn issue_session<S: PlatformStore>(
  store: &S,
  user_id: Uuid,
  ttl: Duration,
) -> Result<IssuedSession> {
  let token = generate_token();
  let expires_at = Utc::now() + ttl;
  let session = store
    .create_session(user_id, &hash_token(&token), expires_at)
    .await
    .map_err(Error::store)?;
  Ok(IssuedSession { token, session })
}

/// Resolve the current principal from a presented session token.
///
/// `Ok(None)` means anonymous: no token, unknown token, or expired session.
/// Store I/O failure is an `Err` so callers can fail closed rather than
/// mistake an outage for a signed-out user they might re-onboard.
///
/// Idempotent and side-effect free; safe to call repeatedly per request.
pub async fn resolve_principal<S: PlatformStore>(
  store: &S,
  raw_token: Option<&str>,
) -> Result<Option<Principal>> {
  let Some(raw) = raw_token else {
    return Ok(None);
  };

  let session = store
    .get_session(&hash_token(raw))
    .await
    .map_err(Error::store)?;

  Ok(session.and_then(|s| {
    if Utc::now() >= s.expires_at {
      None
    } else {
      Some(s.into_principal())
    }
  }))
}

/// Delete the session behind a raw token (sign-out). Unknown tokens are a
/// no-op.
pub async fn revoke_session<S: PlatformStore>(
  store: &S,
  raw_token: &str,
) -> Result<()> {
  store
    .delete_session(&hash_token(raw_token))
    .await
    .map_err(Error::store)
}

//! The route guard: session resolution composed with the role check,
//! per protected endpoint.
//!
//! Handlers call [`guard`] first and act on the `Result` — there is no
//! exception-style early exit. On success the returned [`AuthorizedUser`]
//! is the capability for the rest of the request; identity cannot change
//! mid-request, so nothing downstream re-checks.

use axum::{
  http::{HeaderMap, header},
  response::{IntoResponse, Redirect, Response},
};
use lectern_auth::{Decision, authorize, resolve_principal};
use lectern_core::{
  principal::{Principal, Profile},
  role::RoleSet,
  store::PlatformStore,
};

use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "lectern_session";

/// A failed guard: a 303 redirect to the sign-in surface.
///
/// An anonymous caller, a store failure, and an insufficient role all carry
/// the same `access_denied` code — authorization failures are deliberately
/// indistinguishable from "not signed in" at this surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardRedirect(&'static str);

impl GuardRedirect {
  pub fn error_code(&self) -> &'static str {
    self.0
  }
}

impl IntoResponse for GuardRedirect {
  fn into_response(self) -> Response {
    Redirect::to(&format!("/sign-in?error={}", self.0)).into_response()
  }
}

/// The outcome of a successful guard: the resolved principal and its
/// authorization profile.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
  pub principal: Principal,
  pub profile:   Profile,
}

/// Extract the presented session token: the session cookie, or an
/// `Authorization: Bearer` header for non-browser clients.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
  if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
  {
    for pair in cookies.split(';') {
      if let Some((name, value)) = pair.trim().split_once('=')
        && name == SESSION_COOKIE
        && !value.is_empty()
      {
        return Some(value.to_string());
      }
    }
  }

  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
}

/// Gate a request on `required` roles.
///
/// Resolution goes to the store every time; a resolver failure is treated
/// as anonymous (fail closed) and ends in the same redirect as a role
/// mismatch.
pub async fn guard<S: PlatformStore>(
  state: &AppState<S>,
  headers: &HeaderMap,
  required: RoleSet,
) -> Result<AuthorizedUser, GuardRedirect> {
  let token = session_token(headers);

  let principal = match resolve_principal(state.store.as_ref(), token.as_deref()).await
  {
    Ok(principal) => principal,
    Err(e) => {
      tracing::warn!(error = %e, "session resolution failed; treating as anonymous");
      None
    }
  };

  match authorize(state.store.as_ref(), principal.as_ref(), required).await {
    Decision::Allow(profile) => Ok(AuthorizedUser {
      // Allow implies the principal was present.
      principal: principal.expect("allow decision without principal"),
      profile,
    }),
    Decision::Deny => Err(GuardRedirect("access_denied")),
  }
}

/// `Set-Cookie` value for a freshly issued session token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
  format!(
    "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
  )
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
  format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

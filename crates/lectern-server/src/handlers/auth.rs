//! Account endpoints: sign-up, sign-in, sign-out, password reset, and
//! one-time-token confirmation.

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{AppendHeaders, IntoResponse, Redirect},
};
use chrono::Duration;
use lectern_auth::{
  issue_session, otp,
  password::{hash_password, verify_password},
  revoke_session,
};
use lectern_core::{
  principal::{NewAccount, TokenPurpose},
  store::PlatformStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  error::{Error, Result},
  guard::{clear_session_cookie, session_cookie, session_token},
};

const MIN_PASSWORD_LEN: usize = 8;

fn check_email(email: &str) -> Result<()> {
  if email.is_empty() || !email.contains('@') {
    return Err(Error::BadRequest("invalid email address".into()));
  }
  Ok(())
}

fn check_password(password: &str) -> Result<()> {
  if password.len() < MIN_PASSWORD_LEN {
    return Err(Error::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  Ok(())
}

// ─── Sign-up ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub email:     String,
  pub password:  String,
  pub full_name: Option<String>,
}

/// `POST /auth/sign-up` — create an account with a `student` profile and
/// sign the caller in. Privileged roles are never self-assignable here.
pub async fn sign_up<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignUpBody>,
) -> Result<impl IntoResponse>
where
  S: PlatformStore,
{
  check_email(&body.email)?;
  check_password(&body.password)?;

  let profile = state
    .store
    .create_account(NewAccount {
      email:         body.email,
      password_hash: hash_password(&body.password)?,
      full_name:     body.full_name,
    })
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Conflict("email already registered".into()))?;

  // The confirmation email is out of scope; the link's token is issued so
  // the rest of the flow is real.
  let confirm_token = otp::issue_one_time_token(
    state.store.as_ref(),
    profile.user_id,
    TokenPurpose::EmailVerification,
    Duration::minutes(state.config.otp_ttl_minutes),
  )
  .await?;
  tracing::debug!(
    user_id = %profile.user_id,
    "email confirmation path: /auth/confirm?type=email_verification&token_hash={confirm_token}"
  );

  let ttl = Duration::hours(state.config.session_ttl_hours);
  let issued = issue_session(state.store.as_ref(), profile.user_id, ttl).await?;

  Ok((
    StatusCode::CREATED,
    AppendHeaders([(
      header::SET_COOKIE,
      session_cookie(&issued.token, ttl.num_seconds()),
    )]),
    Json(profile),
  ))
}

// ─── Sign-in ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignInBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/sign-in` — verify the password and issue a session cookie.
pub async fn sign_in<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignInBody>,
) -> Result<impl IntoResponse>
where
  S: PlatformStore,
{
  let credential = state
    .store
    .find_credential(&body.email)
    .await
    .map_err(Error::store)?
    .ok_or(Error::InvalidCredentials)?;

  if !verify_password(&body.password, &credential.password_hash) {
    return Err(Error::InvalidCredentials);
  }

  let profile = state
    .store
    .get_profile(credential.user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::InvalidCredentials)?;

  let ttl = Duration::hours(state.config.session_ttl_hours);
  let issued =
    issue_session(state.store.as_ref(), credential.user_id, ttl).await?;

  Ok((
    AppendHeaders([(
      header::SET_COOKIE,
      session_cookie(&issued.token, ttl.num_seconds()),
    )]),
    Json(profile),
  ))
}

// ─── Sign-out ────────────────────────────────────────────────────────────────

/// `POST /auth/sign-out` — delete the session row and clear the cookie.
/// Idempotent: signing out without a session still clears the cookie.
pub async fn sign_out<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse>
where
  S: PlatformStore,
{
  if let Some(token) = session_token(&headers) {
    revoke_session(state.store.as_ref(), &token).await?;
  }

  Ok((
    StatusCode::NO_CONTENT,
    AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
  ))
}

// ─── Password reset ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PasswordResetBody {
  pub email: String,
}

/// `POST /auth/password-reset-request` — issue a reset token for the
/// account, if one exists. Always answers 202 so the endpoint does not
/// reveal which emails are registered.
pub async fn password_reset_request<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<PasswordResetBody>,
) -> Result<StatusCode>
where
  S: PlatformStore,
{
  check_email(&body.email)?;

  if let Some(credential) = state
    .store
    .find_credential(&body.email)
    .await
    .map_err(Error::store)?
  {
    let token = otp::issue_one_time_token(
      state.store.as_ref(),
      credential.user_id,
      TokenPurpose::PasswordReset,
      Duration::minutes(state.config.otp_ttl_minutes),
    )
    .await?;
    tracing::debug!(
      user_id = %credential.user_id,
      "password reset path: /auth/confirm?type=password_reset&token_hash={token}"
    );
  }

  Ok(StatusCode::ACCEPTED)
}

// ─── One-time-token confirmation ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
  pub token_hash: Option<String>,
  #[serde(rename = "type")]
  pub purpose:    Option<String>,
  pub next:       Option<String>,
}

/// `GET /auth/confirm?token_hash=&type=&next=` — verify and consume a
/// one-time token. Success signs the user in and redirects to `next`;
/// any failure redirects to `next` with `error=access_denied`.
pub async fn confirm<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse>
where
  S: PlatformStore,
{
  let next = params.next.as_deref().unwrap_or("/reset-password");
  let denied = || Redirect::to(&format!("{next}?error=access_denied"));

  let (Some(presented), Some(purpose_str)) =
    (params.token_hash.as_deref(), params.purpose.as_deref())
  else {
    return Ok(denied().into_response());
  };
  let Ok(purpose) = TokenPurpose::parse(purpose_str) else {
    return Ok(denied().into_response());
  };

  let user_id = match otp::verify_one_time_token(
    state.store.as_ref(),
    purpose,
    presented,
  )
  .await?
  {
    Some(user_id) => user_id,
    None => return Ok(denied().into_response()),
  };

  // Token verified: sign the user in so the follow-up (e.g. setting a new
  // password) can run against an authenticated session.
  let ttl = Duration::hours(state.config.session_ttl_hours);
  let issued = issue_session(state.store.as_ref(), user_id, ttl).await?;

  Ok(
    (
      AppendHeaders([(
        header::SET_COOKIE,
        session_cookie(&issued.token, ttl.num_seconds()),
      )]),
      Redirect::to(next),
    )
      .into_response(),
  )
}

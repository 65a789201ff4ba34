//! Server error type and axum [`IntoResponse`] implementation.
//!
//! Two fault surfaces live here. API-style faults render as JSON with a
//! status code. Authorization and invitation-token faults render as a 303
//! redirect to the sign-in page with a distinguishing `error` code, because
//! that is what the browser-facing flows expect — they are page-level
//! outcomes, not generic 500s.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use lectern_core::invitation::TokenFault;
use serde_json::json;
use thiserror::Error;

use crate::guard::GuardRedirect;

#[derive(Debug, Error)]
pub enum Error {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Sign-in failure. One message for unknown email and wrong password, so
  /// the endpoint does not confirm which emails are registered.
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// Redirect to the sign-in surface carrying an error code.
  #[error("redirect to sign-in: {0}")]
  SignInRedirect(&'static str),

  #[error("auth error: {0}")]
  Auth(#[from] lectern_auth::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

impl From<GuardRedirect> for Error {
  fn from(r: GuardRedirect) -> Self {
    Error::SignInRedirect(r.error_code())
  }
}

impl From<TokenFault> for Error {
  fn from(fault: TokenFault) -> Self {
    Error::SignInRedirect(fault.error_code())
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      Error::InvalidCredentials => {
        (StatusCode::UNAUTHORIZED, self.to_string())
      }
      Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      Error::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      Error::SignInRedirect(code) => {
        return Redirect::to(&format!("/sign-in?error={code}"))
          .into_response();
      }
      Error::Auth(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      Error::Store(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

//! Identity types: accounts, sessions, the resolved principal, and the
//! authorization profile.
//!
//! A `Principal` is derived per request from an account joined with a live
//! session row; it is never persisted. The `Profile` is the authorization
//! projection of an account — the only record a role decision may consult.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, role::Role};

/// An authenticated actor, resolved from request credentials.
///
/// The validity window is the session's, re-read from the store on every
/// resolution — a principal is never reconstructed from client-held claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
  pub user_id:    Uuid,
  pub email:      String,
  pub issued_at:  DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

/// The authorization projection of an account. Exactly one per account.
///
/// `role` is mutated only by the administrative role endpoint, never by the
/// principal acting on themself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:    Uuid,
  pub email:      String,
  pub full_name:  Option<String>,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input for account creation. Sign-up always produces a `student` profile;
/// privileged roles are assigned afterwards by an administrator.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub password_hash: String,
  pub full_name:     Option<String>,
}

/// Credential row loaded for password verification at sign-in.
#[derive(Debug, Clone)]
pub struct Credential {
  pub user_id:       Uuid,
  pub email:         String,
  pub password_hash: String,
}

/// A live session row joined with its account.
///
/// Only the SHA-256 hash of the session token is ever stored; the raw token
/// exists client-side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub user_id:    Uuid,
  pub email:      String,
  pub issued_at:  DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn into_principal(self) -> Principal {
    Principal {
      user_id:    self.user_id,
      email:      self.email,
      issued_at:  self.issued_at,
      expires_at: self.expires_at,
    }
  }
}

/// What a one-time token is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
  EmailVerification,
  PasswordReset,
}

impl TokenPurpose {
  pub fn as_str(&self) -> &'static str {
    match self {
      TokenPurpose::EmailVerification => "email_verification",
      TokenPurpose::PasswordReset => "password_reset",
    }
  }

  pub fn parse(s: &str) -> Result<TokenPurpose> {
    match s {
      "email_verification" => Ok(TokenPurpose::EmailVerification),
      "password_reset" => Ok(TokenPurpose::PasswordReset),
      other => Err(Error::UnknownTokenPurpose(other.to_string())),
    }
  }
}

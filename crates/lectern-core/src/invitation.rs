//! Invitations — single-use, time-bounded offers of company membership.
//!
//! An invitation moves through `Issued` → `Accepted` (terminal, stored) or
//! `Expired` (terminal, derived from the clock — never written). Tokens that
//! match no row are reported as invalid and never persisted in any form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A persisted invitation row. The unguessable token itself is stored only
/// as a SHA-256 hash, like session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invitation {
  pub invitation_id: Uuid,
  pub company_id:    Uuid,
  pub email:         String,
  pub created_at:    DateTime<Utc>,
  pub expires_at:    DateTime<Utc>,
  pub accepted_at:   Option<DateTime<Utc>>,
}

/// Input for invitation issuance. The caller generates the token and hands
/// over only its hash.
#[derive(Debug, Clone)]
pub struct NewInvitation {
  pub company_id: Uuid,
  pub email:      String,
  pub token_hash: String,
  pub expires_at: DateTime<Utc>,
}

/// Lifecycle state, computed against a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
  Issued,
  Accepted,
  Expired,
}

impl Invitation {
  /// Current lifecycle state.
  ///
  /// Acceptance is a stored, terminal fact and wins over derived expiry: an
  /// invitation accepted before its deadline stays `Accepted` forever, even
  /// once the deadline passes.
  pub fn status(&self, now: DateTime<Utc>) -> InvitationStatus {
    if self.accepted_at.is_some() {
      InvitationStatus::Accepted
    } else if now >= self.expires_at {
      InvitationStatus::Expired
    } else {
      InvitationStatus::Issued
    }
  }
}

/// Why a presented token was not honoured.
///
/// Each variant carries a distinct user-facing error code so the sign-in
/// surface can render a specific message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenFault {
  #[error("no invitation token supplied")]
  MissingToken,

  #[error("token does not match any invitation")]
  InvalidToken,

  #[error("invitation has expired")]
  ExpiredToken,

  #[error("invitation has already been accepted")]
  AlreadyAccepted,
}

impl TokenFault {
  /// Query-parameter code used on redirects to the sign-in surface.
  pub fn error_code(&self) -> &'static str {
    match self {
      TokenFault::MissingToken => "missing_token",
      TokenFault::InvalidToken => "invalid_token",
      TokenFault::ExpiredToken => "expired_token",
      TokenFault::AlreadyAccepted => "already_accepted",
    }
  }
}

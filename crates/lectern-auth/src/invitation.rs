//! The invitation lifecycle manager: validate and consume single-use,
//! time-bounded invitation tokens.
//!
//! Validation is pure read; consumption re-validates and then delegates to
//! the store's transactional compare-and-set, so a token expiring or being
//! consumed between the two steps is still caught.

use chrono::{Duration, Utc};
use lectern_core::{
  company::Membership,
  invitation::{Invitation, InvitationStatus, NewInvitation, TokenFault},
  principal::Principal,
  store::{AcceptOutcome, PlatformStore},
};
use uuid::Uuid;

use crate::{
  Error, Result,
  token::{generate_token, hash_token},
};

/// Issue an invitation for `email` to join `company_id`.
///
/// Returns the stored row and the raw token. The raw value appears nowhere
/// else — the store holds only its hash — so the caller must deliver it to
/// the invitee immediately.
pub async fn issue_invitation<S: PlatformStore>(
  store: &S,
  company_id: Uuid,
  email: &str,
  validity: Duration,
) -> Result<(Invitation, String)> {
  let token = generate_token();
  let invitation = store
    .create_invitation(NewInvitation {
      company_id,
      email: email.to_string(),
      token_hash: hash_token(&token),
      expires_at: Utc::now() + validity,
    })
    .await
    .map_err(Error::store)?;
  Ok((invitation, token))
}

/// Validate a presented invitation token.
///
/// Checks run in a fixed order, each short-circuiting to its specific
/// fault: presence → lookup → accepted → expired. Acceptance is checked
/// before expiry because it is a stored, terminal fact — an accepted
/// invitation reports `AlreadyAccepted` even after its deadline passes.
///
/// `MissingToken` is returned without touching the store. A store lookup
/// failure is reported as `InvalidToken`: fail closed, never open.
///
/// Validation alone has no side effects; repeated calls on a live token
/// return the same row.
pub async fn validate_token<S: PlatformStore>(
  store: &S,
  token: Option<&str>,
) -> Result<Invitation, TokenFault> {
  let Some(raw) = token.filter(|t| !t.is_empty()) else {
    return Err(TokenFault::MissingToken);
  };

  let invitation = match store.get_invitation(&hash_token(raw)).await {
    Ok(Some(invitation)) => invitation,
    Ok(None) => return Err(TokenFault::InvalidToken),
    Err(e) => {
      tracing::warn!(error = %e, "invitation lookup failed; treating token as invalid");
      return Err(TokenFault::InvalidToken);
    }
  };

  match invitation.status(Utc::now()) {
    InvitationStatus::Accepted => Err(TokenFault::AlreadyAccepted),
    InvitationStatus::Expired => Err(TokenFault::ExpiredToken),
    InvitationStatus::Issued => Ok(invitation),
  }
}

/// Consume an invitation on behalf of `principal`, granting membership.
///
/// Re-validates at acceptance time, then runs the store's conditional
/// accept: the `accepted_at` stamp and the membership insert share one
/// transaction, and the stamp is conditioned on the row still being
/// unaccepted and unexpired. Of two racing calls with the same token,
/// exactly one succeeds; the other observes `AlreadyAccepted`.
pub async fn accept_invitation<S: PlatformStore>(
  store: &S,
  token: &str,
  principal: &Principal,
) -> Result<Membership, TokenFault> {
  validate_token(store, Some(token)).await?;

  let outcome = match store
    .accept_invitation(&hash_token(token), principal.user_id, Utc::now())
    .await
  {
    Ok(outcome) => outcome,
    Err(e) => {
      tracing::warn!(error = %e, "invitation acceptance failed; no membership granted");
      return Err(TokenFault::InvalidToken);
    }
  };

  match outcome {
    AcceptOutcome::Accepted(membership) => Ok(membership),
    AcceptOutcome::AlreadyAccepted => Err(TokenFault::AlreadyAccepted),
    AcceptOutcome::Expired => Err(TokenFault::ExpiredToken),
    AcceptOutcome::NotFound => Err(TokenFault::InvalidToken),
  }
}

//! Invitation validation and acceptance endpoints.
//!
//! Token faults surface as 303 redirects to the sign-in page with a
//! distinguishing error code (`missing_token`, `invalid_token`,
//! `expired_token`, `already_accepted`) — see [`crate::error::Error`].

use axum::{
  Json,
  extract::{Query, State},
  http::HeaderMap,
};
use chrono::{DateTime, Utc};
use lectern_auth::{accept_invitation, validate_token};
use lectern_core::{company::Membership, store::PlatformStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
  guard::guard,
  routes::ANY_SIGNED_IN,
};

#[derive(Debug, Deserialize)]
pub struct ShowParams {
  pub token: Option<String>,
}

/// What the accept-invitation page renders before the user commits.
#[derive(Debug, Serialize)]
pub struct InvitationSummary {
  pub company_id:   Uuid,
  pub company_name: Option<String>,
  pub email:        String,
  pub expires_at:   DateTime<Utc>,
}

/// `GET /accept-invitation?token=` — validate without consuming.
///
/// Validation is read-only and repeatable; the check order (presence →
/// lookup → accepted → expired) picks the specific redirect code.
pub async fn show<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ShowParams>,
) -> Result<Json<InvitationSummary>>
where
  S: PlatformStore,
{
  let invitation =
    validate_token(state.store.as_ref(), params.token.as_deref()).await?;

  let company_name = state
    .store
    .get_company(invitation.company_id)
    .await
    .map_err(Error::store)?
    .map(|c| c.name);

  Ok(Json(InvitationSummary {
    company_id: invitation.company_id,
    company_name,
    email: invitation.email,
    expires_at: invitation.expires_at,
  }))
}

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
  pub token: String,
}

/// `POST /accept-invitation` — consume the token and grant membership.
///
/// Requires a signed-in principal of any role: the invitee typically signs
/// up as a student first, then follows the invitation link. Acceptance
/// re-validates and runs as a conditional write, so a racing or expired
/// token loses here even if it passed validation a moment ago.
pub async fn accept<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<AcceptBody>,
) -> Result<Json<Membership>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, ANY_SIGNED_IN).await?;

  let membership =
    accept_invitation(state.store.as_ref(), &body.token, &user.principal)
      .await?;

  Ok(Json(membership))
}

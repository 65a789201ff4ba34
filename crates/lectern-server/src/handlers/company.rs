//! Company-admin endpoints: company info, member listing, invitation
//! issuance.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chrono::Duration;
use lectern_auth::issue_invitation;
use lectern_core::{
  company::{Company, MemberView},
  invitation::Invitation,
  store::PlatformStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  error::{Error, Result},
  guard::{AuthorizedUser, guard},
  routes::COMPANY_PAGES,
};

/// Load the company administered by the guarded caller.
async fn own_company<S>(
  state: &AppState<S>,
  user: &AuthorizedUser,
) -> Result<Company>
where
  S: PlatformStore,
{
  state
    .store
    .company_for_admin(user.profile.user_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("no company for this account".into()))
}

/// `GET /company`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Company>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, COMPANY_PAGES).await?;
  Ok(Json(own_company(&state, &user).await?))
}

/// `GET /company/members`
pub async fn members<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Vec<MemberView>>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, COMPANY_PAGES).await?;
  let company = own_company(&state, &user).await?;

  let members = state
    .store
    .list_members(company.company_id)
    .await
    .map_err(Error::store)?;
  Ok(Json(members))
}

#[derive(Debug, Deserialize)]
pub struct InviteBody {
  pub email:           String,
  pub expires_in_days: Option<i64>,
}

/// Issued invitation plus the raw token. The token is shown exactly once —
/// only its hash is stored.
#[derive(Debug, Serialize)]
pub struct IssuedInvitation {
  pub invitation: Invitation,
  pub token:      String,
}

/// `POST /company/invitations`
pub async fn invite<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<InviteBody>,
) -> Result<impl IntoResponse>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, COMPANY_PAGES).await?;

  if body.email.is_empty() || !body.email.contains('@') {
    return Err(Error::BadRequest("invalid email address".into()));
  }
  let days = body
    .expires_in_days
    .unwrap_or(state.config.invitation_ttl_days);
  if days <= 0 {
    return Err(Error::BadRequest(
      "expires_in_days must be positive".into(),
    ));
  }

  let company = own_company(&state, &user).await?;

  let (invitation, token) = issue_invitation(
    state.store.as_ref(),
    company.company_id,
    &body.email,
    Duration::days(days),
  )
  .await?;

  Ok((
    StatusCode::CREATED,
    Json(IssuedInvitation { invitation, token }),
  ))
}

//! Platform administration endpoints — `super_admin` only.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use lectern_core::{
  company::{Company, NewCompany},
  principal::Profile,
  role::Role,
  store::PlatformStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
  guard::guard,
  routes::ADMIN_PAGES,
};

/// `GET /admin/users`
pub async fn list_users<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Profile>>>
where
  S: PlatformStore,
{
  guard(&state, &headers, ADMIN_PAGES).await?;
  let profiles = state.store.list_profiles().await.map_err(Error::store)?;
  Ok(Json(profiles))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
  pub role: Role,
}

/// `PUT /admin/users/{id}/role` — the only write path for `role`.
///
/// Admins cannot change their own role: privilege fields are never mutated
/// by the principal acting on themself.
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Path(user_id): Path<Uuid>,
  Json(body): Json<SetRoleBody>,
) -> Result<Json<Profile>>
where
  S: PlatformStore,
{
  let admin = guard(&state, &headers, ADMIN_PAGES).await?;

  if user_id == admin.profile.user_id {
    return Err(Error::Conflict("cannot change your own role".into()));
  }

  let profile = state
    .store
    .set_role(user_id, body.role)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("user {user_id} not found")))?;
  Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyBody {
  pub name:     String,
  pub admin_id: Uuid,
}

/// `POST /admin/companies`
pub async fn create_company<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<CreateCompanyBody>,
) -> Result<impl IntoResponse>
where
  S: PlatformStore,
{
  guard(&state, &headers, ADMIN_PAGES).await?;

  if body.name.trim().is_empty() {
    return Err(Error::BadRequest("company name must not be empty".into()));
  }
  state
    .store
    .get_profile(body.admin_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| {
      Error::BadRequest(format!("user {} not found", body.admin_id))
    })?;

  let company: Company = state
    .store
    .create_company(NewCompany {
      name:     body.name,
      admin_id: body.admin_id,
    })
    .await
    .map_err(Error::store)?;

  Ok((StatusCode::CREATED, Json(company)))
}

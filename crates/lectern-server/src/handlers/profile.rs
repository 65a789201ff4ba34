//! Self-service profile endpoints. Only non-privileged fields are writable
//! here; the `role` column has exactly one write path, in the admin
//! surface.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
};
use lectern_auth::password::hash_password;
use lectern_core::{
  course::Enrollment, principal::Profile, store::PlatformStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  error::{Error, Result},
  guard::guard,
  routes::{ANY_SIGNED_IN, STUDENT_PAGES},
};

/// `GET /profile`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Profile>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, ANY_SIGNED_IN).await?;
  Ok(Json(user.profile))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileBody {
  pub full_name: Option<String>,
}

/// `PUT /profile`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<UpdateProfileBody>,
) -> Result<Json<Profile>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, ANY_SIGNED_IN).await?;

  let profile = state
    .store
    .update_profile_name(user.profile.user_id, body.full_name)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("profile not found".into()))?;
  Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
  pub new_password: String,
}

/// `PUT /profile/password` — used after sign-in or after a reset-token
/// confirmation (which signs the user in).
pub async fn change_password<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  Json(body): Json<ChangePasswordBody>,
) -> Result<StatusCode>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, ANY_SIGNED_IN).await?;

  if body.new_password.len() < 8 {
    return Err(Error::BadRequest(
      "password must be at least 8 characters".into(),
    ));
  }

  state
    .store
    .update_password(user.profile.user_id, &hash_password(&body.new_password)?)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("account not found".into()))?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /profile/enrollments`
pub async fn enrollments<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Enrollment>>>
where
  S: PlatformStore,
{
  let user = guard(&state, &headers, STUDENT_PAGES).await?;

  let enrollments = state
    .store
    .list_enrollments(user.profile.user_id)
    .await
    .map_err(Error::store)?;
  Ok(Json(enrollments))
}

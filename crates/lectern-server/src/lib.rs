//! HTTP layer for the Lectern LMS platform.
//!
//! Exposes an axum [`Router`] backed by any
//! [`lectern_core::store::PlatformStore`]. Every protected route is gated
//! by [`guard::guard`], which composes session resolution with the
//! fail-closed role check and turns failures into sign-in redirects.

pub mod error;
pub mod guard;
pub mod handlers;
pub mod routes;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use lectern_core::store::PlatformStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_session_ttl_hours() -> i64 { 336 }
fn default_invitation_ttl_days() -> i64 { 7 }
fn default_otp_ttl_minutes() -> i64 { 30 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `LECTERN_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours:   i64,
  #[serde(default = "default_invitation_ttl_days")]
  pub invitation_ttl_days: i64,
  #[serde(default = "default_otp_ttl_minutes")]
  pub otp_ttl_minutes:     i64,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
///
/// Constructed once per process and injected; components never reach for an
/// ambient client, which is what lets tests substitute a double.
#[derive(Clone)]
pub struct AppState<S: PlatformStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the platform.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PlatformStore + Clone + Send + Sync + 'static,
{
  use handlers::{admin, auth, company, courses, invitations, profile};

  Router::new()
    // Accounts & sessions
    .route("/auth/sign-up", post(auth::sign_up::<S>))
    .route("/auth/sign-in", post(auth::sign_in::<S>))
    .route("/auth/sign-out", post(auth::sign_out::<S>))
    .route("/auth/password-reset-request", post(auth::password_reset_request::<S>))
    .route("/auth/confirm", get(auth::confirm::<S>))
    // Invitations
    .route("/accept-invitation", get(invitations::show::<S>).post(invitations::accept::<S>))
    // Company surface
    .route("/company", get(company::show::<S>))
    .route("/company/members", get(company::members::<S>))
    .route("/company/invitations", post(company::invite::<S>))
    // Admin surface
    .route("/admin/users", get(admin::list_users::<S>))
    .route("/admin/users/{id}/role", put(admin::set_role::<S>))
    .route("/admin/companies", post(admin::create_company::<S>))
    // Courses & enrollment
    .route("/courses", get(courses::list::<S>).post(courses::create::<S>))
    .route("/courses/{id}/enroll", post(courses::enroll::<S>))
    .route("/courses/{id}/progress", post(courses::progress::<S>))
    // Profile
    .route("/profile", get(profile::show::<S>).put(profile::update::<S>))
    .route("/profile/password", put(profile::change_password::<S>))
    .route("/profile/enrollments", get(profile::enrollments::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use lectern_core::{role::Role, store::PlatformStore};
  use lectern_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host:                "127.0.0.1".to_string(),
        port:                8080,
        store_path:          PathBuf::from(":memory:"),
        session_ttl_hours:   24,
        invitation_ttl_days: 7,
        otp_ttl_minutes:     30,
      }),
    }
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
      builder = builder
        .header(header::COOKIE, format!("lectern_session={cookie}"));
    }
    let request = match body {
      Some(value) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state.clone()).oneshot(request).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Extract the session token from a `Set-Cookie` header.
  fn session_of(resp: &axum::response::Response) -> String {
    let cookie = resp
      .headers()
      .get(header::SET_COOKIE)
      .expect("set-cookie present")
      .to_str()
      .unwrap();
    cookie
      .strip_prefix("lectern_session=")
      .unwrap()
      .split(';')
      .next()
      .unwrap()
      .to_string()
  }

  fn location_of(resp: &axum::response::Response) -> &str {
    resp
      .headers()
      .get(header::LOCATION)
      .expect("location present")
      .to_str()
      .unwrap()
  }

  /// Sign up a user; returns (session token, user id).
  async fn sign_up(
    state: &AppState<SqliteStore>,
    email: &str,
  ) -> (String, Uuid) {
    let resp = send(
      state,
      "POST",
      "/auth/sign-up",
      None,
      Some(json!({ "email": email, "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let token = session_of(&resp);
    let body = json_body(resp).await;
    let user_id = body["user_id"].as_str().unwrap().parse().unwrap();
    (token, user_id)
  }

  /// Sign up and elevate to `role` (sessions stay valid across the role
  /// change — authorization reloads the profile on every request).
  async fn sign_up_as(
    state: &AppState<SqliteStore>,
    email: &str,
    role: Role,
  ) -> (String, Uuid) {
    let (token, user_id) = sign_up(state, email).await;
    state.store.set_role(user_id, role).await.unwrap().unwrap();
    (token, user_id)
  }

  // ── Accounts & sessions ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn sign_up_creates_student_and_signs_in() {
    let state = make_state().await;
    let (token, _) = sign_up(&state, "alice@example.com").await;

    let resp = send(&state, "GET", "/profile", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile = json_body(resp).await;
    assert_eq!(profile["email"], "alice@example.com");
    assert_eq!(profile["role"], "student");
  }

  #[tokio::test]
  async fn duplicate_sign_up_conflicts() {
    let state = make_state().await;
    sign_up(&state, "taken@example.com").await;

    let resp = send(
      &state,
      "POST",
      "/auth/sign-up",
      None,
      Some(json!({ "email": "taken@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn sign_in_rejects_bad_password_and_unknown_email_alike() {
    let state = make_state().await;
    sign_up(&state, "bob@example.com").await;

    for (email, password) in [
      ("bob@example.com", "wrong-password"),
      ("nobody@example.com", "hunter2hunter2"),
    ] {
      let resp = send(
        &state,
        "POST",
        "/auth/sign-in",
        None,
        Some(json!({ "email": email, "password": password })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
      let body = json_body(resp).await;
      assert_eq!(body["error"], "invalid credentials");
    }
  }

  #[tokio::test]
  async fn sign_out_invalidates_the_session() {
    let state = make_state().await;
    let (token, _) = sign_up(&state, "carol@example.com").await;

    let resp =
      send(&state, "POST", "/auth/sign-out", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&state, "GET", "/profile", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/sign-in?error=access_denied");
  }

  // ── Route guard ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn anonymous_request_redirects_to_sign_in() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/admin/users", None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/sign-in?error=access_denied");
  }

  #[tokio::test]
  async fn role_mismatch_redirects_to_sign_in() {
    let state = make_state().await;
    // A student hitting an instructor/super_admin surface.
    let (token, _) = sign_up(&state, "student@example.com").await;

    let resp = send(
      &state,
      "POST",
      "/courses",
      Some(&token),
      Some(json!({ "title": "Nope", "price": 1.0 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/sign-in?error=access_denied");
  }

  #[tokio::test]
  async fn instructor_surface_admits_super_admin() {
    let state = make_state().await;
    let (token, _) =
      sign_up_as(&state, "root@example.com", Role::SuperAdmin).await;

    let resp = send(
      &state,
      "POST",
      "/courses",
      Some(&token),
      Some(json!({ "title": "Ops 101", "price": 0.0 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  #[tokio::test]
  async fn admin_surface_excludes_other_roles() {
    let state = make_state().await;
    for role in [Role::Instructor, Role::CompanyAdmin] {
      let email = format!("{}@example.com", Uuid::new_v4());
      let (token, _) = sign_up_as(&state, &email, role).await;
      let resp = send(&state, "GET", "/admin/users", Some(&token), None).await;
      assert_eq!(resp.status(), StatusCode::SEE_OTHER, "role {role}");
    }
  }

  // ── Admin ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_can_change_roles_but_not_their_own() {
    let state = make_state().await;
    let (admin_token, admin_id) =
      sign_up_as(&state, "root@example.com", Role::SuperAdmin).await;
    let (_, user_id) = sign_up(&state, "promote@example.com").await;

    let resp = send(
      &state,
      "PUT",
      &format!("/admin/users/{user_id}/role"),
      Some(&admin_token),
      Some(json!({ "role": "instructor" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["role"], "instructor");

    let resp = send(
      &state,
      "PUT",
      &format!("/admin/users/{admin_id}/role"),
      Some(&admin_token),
      Some(json!({ "role": "student" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  // ── Invitations ─────────────────────────────────────────────────────────────

  /// Full setup: a super admin, a company run by a company_admin, and an
  /// invitation token for `invitee_email`.
  async fn invitation_fixture(
    state: &AppState<SqliteStore>,
    invitee_email: &str,
  ) -> (String, String) {
    let (root_token, _) =
      sign_up_as(state, "root@example.com", Role::SuperAdmin).await;
    let (company_token, company_admin_id) =
      sign_up_as(state, "cadmin@example.com", Role::CompanyAdmin).await;

    let resp = send(
      state,
      "POST",
      "/admin/companies",
      Some(&root_token),
      Some(json!({ "name": "Acme Learning", "admin_id": company_admin_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(
      state,
      "POST",
      "/company/invitations",
      Some(&company_token),
      Some(json!({ "email": invitee_email })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    let token = body["token"].as_str().unwrap().to_string();
    (company_token, token)
  }

  #[tokio::test]
  async fn invitation_flow_end_to_end() {
    let state = make_state().await;
    let (company_token, invite_token) =
      invitation_fixture(&state, "hire@example.com").await;

    // Validation endpoint shows the offer without consuming it.
    let resp = send(
      &state,
      "GET",
      &format!("/accept-invitation?token={invite_token}"),
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let summary = json_body(resp).await;
    assert_eq!(summary["company_name"], "Acme Learning");
    assert_eq!(summary["email"], "hire@example.com");

    // The invitee signs up and accepts.
    let (invitee_token, invitee_id) =
      sign_up(&state, "hire@example.com").await;
    let resp = send(
      &state,
      "POST",
      "/accept-invitation",
      Some(&invitee_token),
      Some(json!({ "token": invite_token })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let membership = json_body(resp).await;
    assert_eq!(
      membership["user_id"].as_str().unwrap(),
      invitee_id.to_string()
    );

    // A second acceptance observes the terminal state.
    let resp = send(
      &state,
      "POST",
      "/accept-invitation",
      Some(&invitee_token),
      Some(json!({ "token": invite_token })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/sign-in?error=already_accepted");

    // The member shows up exactly once for the company admin.
    let resp = send(
      &state,
      "GET",
      "/company/members",
      Some(&company_token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let members = json_body(resp).await;
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["email"], "hire@example.com");
  }

  #[tokio::test]
  async fn invitation_faults_redirect_with_specific_codes() {
    let state = make_state().await;

    let resp = send(&state, "GET", "/accept-invitation", None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/sign-in?error=missing_token");

    let resp = send(
      &state,
      "GET",
      "/accept-invitation?token=no-such-token",
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/sign-in?error=invalid_token");
  }

  #[tokio::test]
  async fn accepting_while_anonymous_redirects() {
    let state = make_state().await;
    let (_, invite_token) =
      invitation_fixture(&state, "hire@example.com").await;

    let resp = send(
      &state,
      "POST",
      "/accept-invitation",
      None,
      Some(json!({ "token": invite_token })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/sign-in?error=access_denied");
  }

  // ── Courses ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn course_enrollment_and_progress_flow() {
    let state = make_state().await;
    let (instructor_token, _) =
      sign_up_as(&state, "teach@example.com", Role::Instructor).await;

    let resp = send(
      &state,
      "POST",
      "/courses",
      Some(&instructor_token),
      Some(json!({ "title": "Rust for Educators", "price": 49.99 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let course = json_body(resp).await;
    assert_eq!(course["price_minor"], 4999);
    let course_id = course["course_id"].as_str().unwrap().to_string();

    // Public catalogue re-expresses the price in display units.
    let resp = send(&state, "GET", "/courses", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await[0]["price"], 49.99);

    let (student_token, _) = sign_up(&state, "learn@example.com").await;
    let resp = send(
      &state,
      "POST",
      &format!("/courses/{course_id}/enroll"),
      Some(&student_token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
      &state,
      "POST",
      &format!("/courses/{course_id}/progress"),
      Some(&student_token),
      Some(json!({ "percent": 100 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let enrollment = json_body(resp).await;
    assert_eq!(enrollment["progress_percent"], 100);
    assert!(!enrollment["completed_at"].is_null());

    let resp = send(
      &state,
      "POST",
      &format!("/courses/{course_id}/progress"),
      Some(&student_token),
      Some(json!({ "percent": 101 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
      &state,
      "GET",
      "/profile/enrollments",
      Some(&student_token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
  }

  // ── One-time-token confirmation ─────────────────────────────────────────────

  #[tokio::test]
  async fn confirm_link_is_single_use() {
    let state = make_state().await;
    let (_, user_id) = sign_up(&state, "reset@example.com").await;

    let token = lectern_auth::otp::issue_one_time_token(
      state.store.as_ref(),
      user_id,
      lectern_core::principal::TokenPurpose::PasswordReset,
      chrono::Duration::minutes(30),
    )
    .await
    .unwrap();
    let uri = format!(
      "/auth/confirm?type=password_reset&token_hash={token}&next=/reset-password"
    );

    // First follow: signed in and redirected to the reset page.
    let resp = send(&state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&resp), "/reset-password");
    let session = session_of(&resp);

    // The fresh session can set a new password.
    let resp = send(
      &state,
      "PUT",
      "/profile/password",
      Some(&session),
      Some(json!({ "new_password": "correct horse battery" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Second follow of the same link is denied.
    let resp = send(&state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      location_of(&resp),
      "/reset-password?error=access_denied"
    );
  }

  #[tokio::test]
  async fn confirm_without_parameters_is_denied() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/auth/confirm", None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      location_of(&resp),
      "/reset-password?error=access_denied"
    );
  }
}

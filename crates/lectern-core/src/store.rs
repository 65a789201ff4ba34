//! The `PlatformStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `lectern-store-sqlite`). Higher layers (`lectern-auth`,
//! `lectern-server`) depend on this abstraction, not on any concrete
//! backend — which is also what makes every authorization path testable
//! against a double.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  company::{Company, MemberView, Membership, NewCompany},
  course::{Course, Enrollment, NewCourse},
  invitation::{Invitation, NewInvitation},
  principal::{Credential, NewAccount, Profile, Session, TokenPurpose},
  role::Role,
};

// ─── Acceptance outcome ──────────────────────────────────────────────────────

/// Result of the conditional invitation-acceptance write.
///
/// The write is a compare-and-set: the UPDATE that stamps `accepted_at` is
/// conditioned on the row still being unaccepted and unexpired, and the
/// membership insert shares its transaction. When the condition fails, the
/// row is reloaded to say why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
  /// This call consumed the token; exactly one caller ever sees this.
  Accepted(Membership),
  /// The row was already consumed when the UPDATE ran.
  AlreadyAccepted,
  /// The row's deadline passed before the UPDATE ran. The row is untouched.
  Expired,
  /// No invitation matches the token.
  NotFound,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Lectern storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`).
pub trait PlatformStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts & sessions ───────────────────────────────────────────────

  /// Create an account plus its `student` profile in one transaction.
  /// Returns `None` if the email is already registered.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Load the credential row for password verification at sign-in.
  fn find_credential<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + 'a;

  /// Replace the account's password hash. Returns `None` if no such user.
  fn update_password<'a>(
    &'a self,
    user_id: Uuid,
    password_hash: &'a str,
  ) -> impl Future<Output = Result<Option<()>, Self::Error>> + Send + 'a;

  /// Persist a session keyed by the SHA-256 hash of its token.
  fn create_session<'a>(
    &'a self,
    user_id: Uuid,
    token_hash: &'a str,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + 'a;

  /// Load a session (joined with its account) by token hash. Expiry is the
  /// caller's concern; rows are returned as stored.
  fn get_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Delete a session row. Deleting an unknown hash is not an error.
  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── One-time tokens ───────────────────────────────────────────────────

  /// Persist a single-use token (email confirmation, password reset).
  fn create_one_time_token<'a>(
    &'a self,
    user_id: Uuid,
    purpose: TokenPurpose,
    token_hash: &'a str,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Consume a one-time token: a compare-and-set on `consumed_at IS NULL
  /// AND expires_at > now`. Returns the owning user id on the first valid
  /// consumption, `None` on any other (unknown, expired, already used).
  fn consume_one_time_token<'a>(
    &'a self,
    purpose: TokenPurpose,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Load the authorization profile for a user. Returns `None` if absent —
  /// callers must treat that as a denial, not a default role.
  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn list_profiles(
    &self,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Administrative role mutation — the only write path for `role`.
  /// Returns the updated profile, or `None` if no such user.
  fn set_role(
    &self,
    user_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Self-service update of non-privileged profile fields.
  fn update_profile_name(
    &self,
    user_id: Uuid,
    full_name: Option<String>,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  // ── Companies & membership ────────────────────────────────────────────

  fn create_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  fn get_company(
    &self,
    company_id: Uuid,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  /// The company a given user administers, if any.
  fn company_for_admin(
    &self,
    admin_id: Uuid,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  /// Members of a company, joined with their profiles, newest first.
  fn list_members(
    &self,
    company_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MemberView>, Self::Error>> + Send + '_;

  // ── Invitations ───────────────────────────────────────────────────────

  fn create_invitation(
    &self,
    input: NewInvitation,
  ) -> impl Future<Output = Result<Invitation, Self::Error>> + Send + '_;

  /// Look an invitation up by token hash. Read-only; validation semantics
  /// live in `lectern-auth`.
  fn get_invitation<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Invitation>, Self::Error>> + Send + 'a;

  /// Atomically consume an invitation and grant membership; see
  /// [`AcceptOutcome`]. Two racing calls on the same token: exactly one
  /// observes `Accepted`.
  fn accept_invitation<'a>(
    &'a self,
    token_hash: &'a str,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<AcceptOutcome, Self::Error>> + Send + 'a;

  // ── Courses & enrollment ──────────────────────────────────────────────

  fn create_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn list_courses(
    &self,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// Enroll a user. Idempotent: re-enrolling returns the existing row.
  /// Returns `None` if the course does not exist.
  fn enroll(
    &self,
    course_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Enrollment>, Self::Error>> + Send + '_;

  /// Update progress for an enrollment. The first time percent reaches 100
  /// the completion timestamp is stamped; it is never cleared afterwards.
  /// Returns `None` if the user is not enrolled.
  fn record_progress(
    &self,
    course_id: Uuid,
    user_id: Uuid,
    percent: u8,
  ) -> impl Future<Output = Result<Option<Enrollment>, Self::Error>> + Send + '_;

  fn list_enrollments(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + '_;
}

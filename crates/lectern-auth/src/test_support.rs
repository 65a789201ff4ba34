//! Shared fixtures for the crate's tests: account/company helpers against
//! the SQLite store, plus two store doubles — one that panics on any access
//! and one that fails every call.

use chrono::{DateTime, Utc};
use lectern_core::{
  company::{Company, MemberView, NewCompany},
  course::{Course, Enrollment, NewCourse},
  invitation::{Invitation, NewInvitation},
  principal::{
    Credential, NewAccount, Principal, Profile, Session, TokenPurpose,
  },
  role::Role,
  store::{AcceptOutcome, PlatformStore},
};
use lectern_store_sqlite::SqliteStore;
use uuid::Uuid;

/// A password hash stand-in for fixtures that never sign in.
const TEST_PHC: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGVzdHNhbHQ$dGVzdA";

pub async fn student_account(store: &SqliteStore, email: &str) -> Profile {
  store
    .create_account(NewAccount {
      email:         email.to_string(),
      password_hash: TEST_PHC.to_string(),
      full_name:     None,
    })
    .await
    .expect("create account")
    .expect("email unique in fixture")
}

pub async fn account_with_role(store: &SqliteStore, role: Role) -> Profile {
  let email = format!("{}@example.com", Uuid::new_v4());
  let profile = student_account(store, &email).await;
  store
    .set_role(profile.user_id, role)
    .await
    .expect("set role")
    .expect("profile exists")
}

pub fn principal_for(profile: &Profile) -> Principal {
  Principal {
    user_id:    profile.user_id,
    email:      profile.email.clone(),
    issued_at:  Utc::now(),
    expires_at: Utc::now() + chrono::Duration::hours(1),
  }
}

pub async fn company_of(store: &SqliteStore, admin: &Profile) -> Company {
  store
    .create_company(NewCompany {
      name:     "Acme Learning".to_string(),
      admin_id: admin.user_id,
    })
    .await
    .expect("create company")
}

// ─── Store doubles ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("store offline")]
pub struct Offline;

/// Fails every call — for fail-closed tests.
pub struct FailingStore;

/// Panics on any call — proves a code path performs no store access.
pub struct UnreachableStore;

macro_rules! stub_store {
  ($name:ident, $body:expr) => {
    impl PlatformStore for $name {
      type Error = Offline;

      async fn create_account(
        &self,
        _: NewAccount,
      ) -> Result<Option<Profile>, Offline> {
        $body
      }
      async fn find_credential(
        &self,
        _: &str,
      ) -> Result<Option<Credential>, Offline> {
        $body
      }
      async fn update_password(
        &self,
        _: Uuid,
        _: &str,
      ) -> Result<Option<()>, Offline> {
        $body
      }
      async fn create_session(
        &self,
        _: Uuid,
        _: &str,
        _: DateTime<Utc>,
      ) -> Result<Session, Offline> {
        $body
      }
      async fn get_session(&self, _: &str) -> Result<Option<Session>, Offline> {
        $body
      }
      async fn delete_session(&self, _: &str) -> Result<(), Offline> {
        $body
      }
      async fn create_one_time_token(
        &self,
        _: Uuid,
        _: TokenPurpose,
        _: &str,
        _: DateTime<Utc>,
      ) -> Result<(), Offline> {
        $body
      }
      async fn consume_one_time_token(
        &self,
        _: TokenPurpose,
        _: &str,
        _: DateTime<Utc>,
      ) -> Result<Option<Uuid>, Offline> {
        $body
      }
      async fn get_profile(&self, _: Uuid) -> Result<Option<Profile>, Offline> {
        $body
      }
      async fn list_profiles(&self) -> Result<Vec<Profile>, Offline> {
        $body
      }
      async fn set_role(
        &self,
        _: Uuid,
        _: Role,
      ) -> Result<Option<Profile>, Offline> {
        $body
      }
      async fn update_profile_name(
        &self,
        _: Uuid,
        _: Option<String>,
      ) -> Result<Option<Profile>, Offline> {
        $body
      }
      async fn create_company(
        &self,
        _: NewCompany,
      ) -> Result<Company, Offline> {
        $body
      }
      async fn get_company(&self, _: Uuid) -> Result<Option<Company>, Offline> {
        $body
      }
      async fn company_for_admin(
        &self,
        _: Uuid,
      ) -> Result<Option<Company>, Offline> {
        $body
      }
      async fn list_members(
        &self,
        _: Uuid,
      ) -> Result<Vec<MemberView>, Offline> {
        $body
      }
      async fn create_invitation(
        &self,
        _: NewInvitation,
      ) -> Result<Invitation, Offline> {
        $body
      }
      async fn get_invitation(
        &self,
        _: &str,
      ) -> Result<Option<Invitation>, Offline> {
        $body
      }
      async fn accept_invitation(
        &self,
        _: &str,
        _: Uuid,
        _: DateTime<Utc>,
      ) -> Result<AcceptOutcome, Offline> {
        $body
      }
      async fn create_course(&self, _: NewCourse) -> Result<Course, Offline> {
        $body
      }
      async fn list_courses(&self) -> Result<Vec<Course>, Offline> {
        $body
      }
      async fn get_course(&self, _: Uuid) -> Result<Option<Course>, Offline> {
        $body
      }
      async fn enroll(
        &self,
        _: Uuid,
        _: Uuid,
      ) -> Result<Option<Enrollment>, Offline> {
        $body
      }
      async fn record_progress(
        &self,
        _: Uuid,
        _: Uuid,
        _: u8,
      ) -> Result<Option<Enrollment>, Offline> {
        $body
      }
      async fn list_enrollments(
        &self,
        _: Uuid,
      ) -> Result<Vec<Enrollment>, Offline> {
        $body
      }
    }
  };
}

stub_store!(FailingStore, Err(Offline));
stub_store!(UnreachableStore, unreachable!("store must not be touched"));

//! The role authorizer: principal → allow/deny against a route's role set.
//!
//! Fails closed on every uncertain path: anonymous caller, missing profile
//! row, store failure. The profile row is loaded fresh on each decision —
//! there is no role cache to go stale.

use lectern_core::{
  principal::{Principal, Profile},
  role::RoleSet,
  store::PlatformStore,
};

/// An authorization decision. `Allow` carries the loaded profile so the
/// caller can proceed without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  Allow(Profile),
  Deny,
}

impl Decision {
  pub fn is_allow(&self) -> bool {
    matches!(self, Decision::Allow(_))
  }
}

/// Decide whether `principal` may exercise a capability requiring one of
/// `required`.
///
/// Read-only: never mutates role state. A store error is logged and mapped
/// to `Deny` — an authorization check that cannot complete with certainty
/// must not allow.
pub async fn authorize<S: PlatformStore>(
  store: &S,
  principal: Option<&Principal>,
  required: RoleSet,
) -> Decision {
  let Some(principal) = principal else {
    return Decision::Deny;
  };

  let profile = match store.get_profile(principal.user_id).await {
    Ok(Some(profile)) => profile,
    Ok(None) => {
      tracing::warn!(user_id = %principal.user_id, "principal has no profile row");
      return Decision::Deny;
    }
    Err(e) => {
      tracing::warn!(error = %e, "profile lookup failed; denying");
      return Decision::Deny;
    }
  };

  if required.contains(profile.role) {
    Decision::Allow(profile)
  } else {
    Decision::Deny
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};
  use lectern_core::role::{Role, RoleSet};
  use lectern_store_sqlite::SqliteStore;
  use uuid::Uuid;

  use super::*;
  use crate::test_support::{FailingStore, account_with_role, principal_for};

  const INSTRUCTOR_PAGES: RoleSet =
    RoleSet::of(&[Role::Instructor, Role::SuperAdmin]);
  const ADMIN_PAGES: RoleSet = RoleSet::of(&[Role::SuperAdmin]);

  #[tokio::test]
  async fn allows_member_roles_and_denies_the_rest() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    for (role, expect_allow) in [
      (Role::Student, false),
      (Role::Instructor, true),
      (Role::CompanyAdmin, false),
      (Role::SuperAdmin, true),
    ] {
      let profile = account_with_role(&store, role).await;
      let principal = principal_for(&profile);
      let decision =
        authorize(&store, Some(&principal), INSTRUCTOR_PAGES).await;
      assert_eq!(decision.is_allow(), expect_allow, "role {role}");
    }
  }

  #[tokio::test]
  async fn anonymous_is_denied_regardless_of_requirement() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert_eq!(authorize(&store, None, ADMIN_PAGES).await, Decision::Deny);
    assert_eq!(
      authorize(&store, None, RoleSet::of(&[])).await,
      Decision::Deny
    );
  }

  #[tokio::test]
  async fn missing_profile_row_is_denied() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let ghost = Principal {
      user_id:    Uuid::new_v4(),
      email:      "ghost@example.com".into(),
      issued_at:  Utc::now(),
      expires_at: Utc::now() + Duration::hours(1),
    };
    assert_eq!(
      authorize(&store, Some(&ghost), INSTRUCTOR_PAGES).await,
      Decision::Deny
    );
  }

  #[tokio::test]
  async fn store_failure_fails_closed() {
    let principal = Principal {
      user_id:    Uuid::new_v4(),
      email:      "anyone@example.com".into(),
      issued_at:  Utc::now(),
      expires_at: Utc::now() + Duration::hours(1),
    };
    let decision =
      authorize(&FailingStore, Some(&principal), INSTRUCTOR_PAGES).await;
    assert_eq!(decision, Decision::Deny);
  }

  #[tokio::test]
  async fn allow_carries_the_loaded_profile() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let profile = account_with_role(&store, Role::SuperAdmin).await;
    let principal = principal_for(&profile);

    match authorize(&store, Some(&principal), ADMIN_PAGES).await {
      Decision::Allow(loaded) => assert_eq!(loaded, profile),
      Decision::Deny => panic!("super_admin must pass the admin gate"),
    }
  }
}

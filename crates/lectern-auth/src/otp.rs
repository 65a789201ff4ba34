//! One-time tokens for email confirmation and password reset.
//!
//! Same storage discipline as sessions: the raw token travels in the
//! emailed link, only its SHA-256 hash is persisted. Consumption is a
//! compare-and-set in the store, so a link can be followed successfully at
//! most once.

use chrono::{Duration, Utc};
use lectern_core::{principal::TokenPurpose, store::PlatformStore};
use uuid::Uuid;

use crate::{
  Error, Result,
  token::{generate_token, hash_token},
};

/// Issue a one-time token for `user_id`. Returns the raw token for the
/// outbound link; the store keeps only the hash.
pub async fn issue_one_time_token<S: PlatformStore>(
  store: &S,
  user_id: Uuid,
  purpose: TokenPurpose,
  validity: Duration,
) -> Result<String> {
  let token = generate_token();
  store
    .create_one_time_token(
      user_id,
      purpose,
      &hash_token(&token),
      Utc::now() + validity,
    )
    .await
    .map_err(Error::store)?;
  Ok(token)
}

/// Verify and consume a presented one-time token.
///
/// Returns the owning user id on the first valid presentation; `None` for
/// unknown, expired, wrong-purpose, or already-consumed tokens. The caller
/// converts `None` into its access-denied surface.
pub async fn verify_one_time_token<S: PlatformStore>(
  store: &S,
  purpose: TokenPurpose,
  presented: &str,
) -> Result<Option<Uuid>> {
  store
    .consume_one_time_token(purpose, &hash_token(presented), Utc::now())
    .await
    .map_err(Error::store)
}

#[cfg(test)]
mod tests {
  use lectern_store_sqlite::SqliteStore;

  use super::*;
  use crate::test_support::student_account;

  #[tokio::test]
  async fn token_is_single_use() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let profile = student_account(&store, "reset@example.com").await;

    let token = issue_one_time_token(
      &store,
      profile.user_id,
      TokenPurpose::PasswordReset,
      Duration::minutes(30),
    )
    .await
    .unwrap();

    let first =
      verify_one_time_token(&store, TokenPurpose::PasswordReset, &token)
        .await
        .unwrap();
    assert_eq!(first, Some(profile.user_id));

    let second =
      verify_one_time_token(&store, TokenPurpose::PasswordReset, &token)
        .await
        .unwrap();
    assert_eq!(second, None);
  }

  #[tokio::test]
  async fn purpose_must_match() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let profile = student_account(&store, "confirm@example.com").await;

    let token = issue_one_time_token(
      &store,
      profile.user_id,
      TokenPurpose::EmailVerification,
      Duration::minutes(30),
    )
    .await
    .unwrap();

    let wrong =
      verify_one_time_token(&store, TokenPurpose::PasswordReset, &token)
        .await
        .unwrap();
    assert_eq!(wrong, None);

    // The mismatched attempt must not have burned the token.
    let right =
      verify_one_time_token(&store, TokenPurpose::EmailVerification, &token)
        .await
        .unwrap();
    assert_eq!(right, Some(profile.user_id));
  }

  #[tokio::test]
  async fn expired_token_is_rejected() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let profile = student_account(&store, "slow@example.com").await;

    let token = issue_one_time_token(
      &store,
      profile.user_id,
      TokenPurpose::PasswordReset,
      Duration::seconds(-1),
    )
    .await
    .unwrap();

    let result =
      verify_one_time_token(&store, TokenPurpose::PasswordReset, &token)
        .await
        .unwrap();
    assert_eq!(result, None);
  }
}

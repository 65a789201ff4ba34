//! Companies and memberships.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// An organization that licenses courses for its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
  pub company_id: Uuid,
  pub name:       String,
  pub admin_id:   Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
  pub name:     String,
  pub admin_id: Uuid,
}

/// A user's membership in a company. Unique per (company, user); created
/// exactly once, by invitation acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
  pub membership_id: Uuid,
  pub company_id:    Uuid,
  pub user_id:       Uuid,
  pub joined_at:     DateTime<Utc>,
}

/// A membership joined with profile fields, for member listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
  pub membership: Membership,
  pub email:      String,
  pub full_name:  Option<String>,
}

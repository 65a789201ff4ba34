//! Roles and per-route role sets.
//!
//! `Role` is a closed enum so authorization checks are exhaustive at compile
//! time. A `RoleSet` is the static capability requirement a protected route
//! declares; there is no implicit super-admin override — every route names
//! the roles it admits.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Permission level attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Student,
  Instructor,
  CompanyAdmin,
  SuperAdmin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Student => "student",
      Role::Instructor => "instructor",
      Role::CompanyAdmin => "company_admin",
      Role::SuperAdmin => "super_admin",
    }
  }

  pub fn parse(s: &str) -> Result<Role> {
    match s {
      "student" => Ok(Role::Student),
      "instructor" => Ok(Role::Instructor),
      "company_admin" => Ok(Role::CompanyAdmin),
      "super_admin" => Ok(Role::SuperAdmin),
      other => Err(Error::UnknownRole(other.to_string())),
    }
  }
}

impl core::fmt::Display for Role {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The set of roles permitted to exercise a capability.
///
/// Backed by a static slice so route requirements can be declared as consts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
  pub const fn of(roles: &'static [Role]) -> Self {
    Self(roles)
  }

  pub fn contains(&self, role: Role) -> bool {
    self.0.contains(&role)
  }

  pub fn roles(&self) -> &'static [Role] {
    self.0
  }
}

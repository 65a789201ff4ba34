//! Static capability requirements for protected routes.
//!
//! Every protected route names its allowed roles explicitly; there is no
//! blanket super-admin override. Instructor, company, and student surfaces
//! admit `super_admin` alongside their primary role so platform operators
//! can inspect them; the admin surface is `super_admin` only.

use lectern_core::role::{Role, RoleSet};

/// Student dashboard, enrollment, and progress endpoints.
pub const STUDENT_PAGES: RoleSet =
  RoleSet::of(&[Role::Student, Role::SuperAdmin]);

/// Course authoring endpoints.
pub const INSTRUCTOR_PAGES: RoleSet =
  RoleSet::of(&[Role::Instructor, Role::SuperAdmin]);

/// Company dashboard, members, and invitation issuance.
pub const COMPANY_PAGES: RoleSet =
  RoleSet::of(&[Role::CompanyAdmin, Role::SuperAdmin]);

/// Platform administration: user listing, role mutation, companies.
pub const ADMIN_PAGES: RoleSet = RoleSet::of(&[Role::SuperAdmin]);

/// Endpoints any authenticated user may hit (own profile, invitation
/// acceptance).
pub const ANY_SIGNED_IN: RoleSet = RoleSet::of(&[
  Role::Student,
  Role::Instructor,
  Role::CompanyAdmin,
  Role::SuperAdmin,
]);

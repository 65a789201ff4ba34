//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings. They round-trip exactly, and they
//! compare chronologically under SQL string comparison: the date/time
//! prefix is fixed-width, fractional digits come in blocks of 3/6/9 with
//! trailing zeros trimmed, and the `+`/`.` terminators sort below every
//! digit. The conditional writes in `store` rely on that ordering. UUIDs
//! are hyphenated lowercase; roles and token purposes use their canonical
//! snake_case names.

use chrono::{DateTime, Utc};
use lectern_core::{
  company::{Company, MemberView, Membership},
  course::{Course, Enrollment},
  invitation::Invitation,
  principal::{Profile, Session, TokenPurpose},
  role::Role,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role / TokenPurpose ─────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str { role.as_str() }

pub fn decode_role(s: &str) -> Result<Role> { Ok(Role::parse(s)?) }

pub fn encode_purpose(p: TokenPurpose) -> &'static str { p.as_str() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `profiles` row joined with `accounts`.
pub struct RawProfile {
  pub user_id:    String,
  pub email:      String,
  pub full_name:  Option<String>,
  pub role:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      full_name:  self.full_name,
      role:       decode_role(&self.role)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from a `sessions` row joined with `accounts`.
pub struct RawSession {
  pub user_id:    String,
  pub email:      String,
  pub issued_at:  String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      issued_at:  decode_dt(&self.issued_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

/// Raw strings read from a `company_invitations` row.
pub struct RawInvitation {
  pub invitation_id: String,
  pub company_id:    String,
  pub email:         String,
  pub created_at:    String,
  pub expires_at:    String,
  pub accepted_at:   Option<String>,
}

impl RawInvitation {
  pub fn into_invitation(self) -> Result<Invitation> {
    Ok(Invitation {
      invitation_id: decode_uuid(&self.invitation_id)?,
      company_id:    decode_uuid(&self.company_id)?,
      email:         self.email,
      created_at:    decode_dt(&self.created_at)?,
      expires_at:    decode_dt(&self.expires_at)?,
      accepted_at:   self
        .accepted_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw strings read from a `companies` row.
pub struct RawCompany {
  pub company_id: String,
  pub name:       String,
  pub admin_id:   String,
  pub created_at: String,
}

impl RawCompany {
  pub fn into_company(self) -> Result<Company> {
    Ok(Company {
      company_id: decode_uuid(&self.company_id)?,
      name:       self.name,
      admin_id:   decode_uuid(&self.admin_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `company_members` row, optionally joined with
/// the member's account and profile for listings.
pub struct RawMembership {
  pub membership_id: String,
  pub company_id:    String,
  pub user_id:       String,
  pub joined_at:     String,
}

impl RawMembership {
  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      membership_id: decode_uuid(&self.membership_id)?,
      company_id:    decode_uuid(&self.company_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      joined_at:     decode_dt(&self.joined_at)?,
    })
  }
}

pub struct RawMemberView {
  pub membership: RawMembership,
  pub email:      String,
  pub full_name:  Option<String>,
}

impl RawMemberView {
  pub fn into_member_view(self) -> Result<MemberView> {
    Ok(MemberView {
      membership: self.membership.into_membership()?,
      email:      self.email,
      full_name:  self.full_name,
    })
  }
}

/// Raw strings read from a `courses` row.
pub struct RawCourse {
  pub course_id:     String,
  pub title:         String,
  pub description:   Option<String>,
  pub instructor_id: String,
  pub price_minor:   i64,
  pub currency:      String,
  pub created_at:    String,
}

impl RawCourse {
  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:     decode_uuid(&self.course_id)?,
      title:         self.title,
      description:   self.description,
      instructor_id: decode_uuid(&self.instructor_id)?,
      price_minor:   self.price_minor,
      currency:      self.currency,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from an `enrollments` row.
pub struct RawEnrollment {
  pub enrollment_id:    String,
  pub course_id:        String,
  pub user_id:          String,
  pub enrolled_at:      String,
  pub progress_percent: i64,
  pub completed_at:     Option<String>,
}

impl RawEnrollment {
  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      enrollment_id:    decode_uuid(&self.enrollment_id)?,
      course_id:        decode_uuid(&self.course_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      enrolled_at:      decode_dt(&self.enrolled_at)?,
      progress_percent: self.progress_percent as u8,
      completed_at:     self
        .completed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

//! Courses and enrollments — the thin records behind progress tracking.
//!
//! Course content (curriculum, lessons, quizzes) is out of scope; a course
//! here is the envelope students enroll against.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result};

/// A purchasable course. Price is stored in minor units of `currency`
/// (see [`crate::money`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
  pub course_id:     Uuid,
  pub title:         String,
  pub description:   Option<String>,
  pub instructor_id: Uuid,
  pub price_minor:   i64,
  pub currency:      String,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
  pub title:         String,
  pub description:   Option<String>,
  pub instructor_id: Uuid,
  pub price_minor:   i64,
  pub currency:      String,
}

/// A student's enrollment in a course. Unique per (course, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
  pub enrollment_id:    Uuid,
  pub course_id:        Uuid,
  pub user_id:          Uuid,
  pub enrolled_at:      DateTime<Utc>,
  /// 0–100 inclusive.
  pub progress_percent: u8,
  /// Set once, the first time progress reaches 100.
  pub completed_at:     Option<DateTime<Utc>>,
}

/// Reject progress values outside 0–100 before they reach the store.
pub fn validate_percent(percent: u8) -> Result<u8> {
  if percent > 100 {
    return Err(Error::ProgressOutOfRange(percent));
  }
  Ok(percent)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percent_bounds() {
    assert!(validate_percent(0).is_ok());
    assert!(validate_percent(100).is_ok());
    assert!(validate_percent(101).is_err());
  }
}

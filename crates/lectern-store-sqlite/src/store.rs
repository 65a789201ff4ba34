//! [`SqliteStore`] — the SQLite implementation of [`PlatformStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use lectern_core::{
  company::{Company, MemberView, NewCompany},
  course::{Course, Enrollment, NewCourse},
  invitation::{Invitation, NewInvitation},
  principal::{Credential, NewAccount, Profile, Session, TokenPurpose},
  role::Role,
  store::{AcceptOutcome, PlatformStore},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawCompany, RawCourse, RawEnrollment, RawInvitation, RawMemberView,
    RawMembership, RawProfile, RawSession, encode_dt, encode_purpose,
    encode_role, encode_uuid,
  },
  schema::SCHEMA,
};

/// Columns selected for a profile row (joined with its account for the
/// email).
const PROFILE_COLS: &str = "p.user_id, a.email, p.full_name, p.role, \
                            p.created_at, p.updated_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lectern platform store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// queue onto one connection, so each `call` closure (and the transactions
/// inside) executes atomically with respect to every other.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Outcome of the acceptance transaction, in raw column form so it can
/// cross the connection-thread boundary.
enum RawAccept {
  Accepted(RawMembership),
  AlreadyAccepted,
  Expired,
  NotFound,
}

fn profile_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProfile> {
  Ok(RawProfile {
    user_id:    row.get(0)?,
    email:      row.get(1)?,
    full_name:  row.get(2)?,
    role:       row.get(3)?,
    created_at: row.get(4)?,
    updated_at: row.get(5)?,
  })
}

fn invitation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawInvitation> {
  Ok(RawInvitation {
    invitation_id: row.get(0)?,
    company_id:    row.get(1)?,
    email:         row.get(2)?,
    created_at:    row.get(3)?,
    expires_at:    row.get(4)?,
    accepted_at:   row.get(5)?,
  })
}

fn course_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCourse> {
  Ok(RawCourse {
    course_id:     row.get(0)?,
    title:         row.get(1)?,
    description:   row.get(2)?,
    instructor_id: row.get(3)?,
    price_minor:   row.get(4)?,
    currency:      row.get(5)?,
    created_at:    row.get(6)?,
  })
}

fn enrollment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEnrollment> {
  Ok(RawEnrollment {
    enrollment_id:    row.get(0)?,
    course_id:        row.get(1)?,
    user_id:          row.get(2)?,
    enrolled_at:      row.get(3)?,
    progress_percent: row.get(4)?,
    completed_at:     row.get(5)?,
  })
}

// ─── PlatformStore impl ──────────────────────────────────────────────────────

impl PlatformStore for SqliteStore {
  type Error = Error;

  // ── Accounts & sessions ───────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Option<Profile>> {
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(now);
    let email = input.email.clone();
    let full_name = input.full_name.clone();
    let password_hash = input.password_hash;

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO accounts (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email, password_hash, at_str],
        )?;
        tx.execute(
          "INSERT INTO profiles (user_id, full_name, role, created_at, updated_at)
           VALUES (?1, ?2, 'student', ?3, ?3)",
          rusqlite::params![id_str, full_name, at_str],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Ok(None);
    }

    Ok(Some(Profile {
      user_id,
      email: input.email,
      full_name: input.full_name,
      role: Role::Student,
      created_at: now,
      updated_at: now,
    }))
  }

  async fn find_credential(&self, email: &str) -> Result<Option<Credential>> {
    let email = email.to_owned();

    let raw: Option<(String, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash
               FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(id, email, password_hash)| {
        Ok(Credential {
          user_id: crate::encode::decode_uuid(&id)?,
          email,
          password_hash,
        })
      })
      .transpose()
  }

  async fn update_password(
    &self,
    user_id: Uuid,
    password_hash: &str,
  ) -> Result<Option<()>> {
    let id_str = encode_uuid(user_id);
    let hash = password_hash.to_owned();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET password_hash = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, hash],
        )?)
      })
      .await?;

    Ok((changed > 0).then_some(()))
  }

  async fn create_session(
    &self,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
  ) -> Result<Session> {
    let issued_at = Utc::now();

    let id_str = encode_uuid(user_id);
    let hash = token_hash.to_owned();
    let issued_str = encode_dt(issued_at);
    let expires_str = encode_dt(expires_at);

    let email: String = self
      .conn
      .call(move |conn| {
        let email: String = conn.query_row(
          "SELECT email FROM accounts WHERE user_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, issued_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash, id_str, issued_str, expires_str],
        )?;
        Ok(email)
      })
      .await?;

    Ok(Session { user_id, email, issued_at, expires_at })
  }

  async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT s.user_id, a.email, s.issued_at, s.expires_at
               FROM sessions s JOIN accounts a ON a.user_id = s.user_id
               WHERE s.token_hash = ?1",
              rusqlite::params![hash],
              |row| {
                Ok(RawSession {
                  user_id:    row.get(0)?,
                  email:      row.get(1)?,
                  issued_at:  row.get(2)?,
                  expires_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<()> {
    let hash = token_hash.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── One-time tokens ───────────────────────────────────────────────────────

  async fn create_one_time_token(
    &self,
    user_id: Uuid,
    purpose: TokenPurpose,
    token_hash: &str,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str = encode_uuid(user_id);
    let purpose_str = encode_purpose(purpose).to_owned();
    let hash = token_hash.to_owned();
    let expires_str = encode_dt(expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO one_time_tokens (token_hash, user_id, purpose, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash, id_str, purpose_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn consume_one_time_token(
    &self,
    purpose: TokenPurpose,
    token_hash: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<Uuid>> {
    let purpose_str = encode_purpose(purpose).to_owned();
    let hash = token_hash.to_owned();
    let now_str = encode_dt(now);

    let user_id: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Compare-and-set: only an unconsumed, unexpired row is stamped.
        let changed = tx.execute(
          "UPDATE one_time_tokens SET consumed_at = ?1
           WHERE token_hash = ?2 AND purpose = ?3
             AND consumed_at IS NULL AND expires_at > ?1",
          rusqlite::params![now_str, hash, purpose_str],
        )?;

        let user_id = if changed == 1 {
          Some(tx.query_row(
            "SELECT user_id FROM one_time_tokens WHERE token_hash = ?1",
            rusqlite::params![hash],
            |row| row.get::<_, String>(0),
          )?)
        } else {
          None
        };

        tx.commit()?;
        Ok(user_id)
      })
      .await?;

    user_id
      .map(|id| crate::encode::decode_uuid(&id))
      .transpose()
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PROFILE_COLS}
                 FROM profiles p JOIN accounts a ON a.user_id = p.user_id
                 WHERE p.user_id = ?1"
              ),
              rusqlite::params![id_str],
              profile_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLS}
           FROM profiles p JOIN accounts a ON a.user_id = p.user_id
           ORDER BY p.created_at"
        ))?;
        let rows = stmt
          .query_map([], profile_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn set_role(
    &self,
    user_id: Uuid,
    role: Role,
  ) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);
    let role_str = encode_role(role).to_owned();
    let at_str = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET role = ?2, updated_at = ?3 WHERE user_id = ?1",
          rusqlite::params![id_str, role_str, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_profile(user_id).await
  }

  async fn update_profile_name(
    &self,
    user_id: Uuid,
    full_name: Option<String>,
  ) -> Result<Option<Profile>> {
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET full_name = ?2, updated_at = ?3
           WHERE user_id = ?1",
          rusqlite::params![id_str, full_name, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_profile(user_id).await
  }

  // ── Companies & membership ────────────────────────────────────────────────

  async fn create_company(&self, input: NewCompany) -> Result<Company> {
    let company = Company {
      company_id: Uuid::new_v4(),
      name:       input.name,
      admin_id:   input.admin_id,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(company.company_id);
    let name = company.name.clone();
    let admin_str = encode_uuid(company.admin_id);
    let at_str = encode_dt(company.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO companies (company_id, name, admin_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, admin_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(company)
  }

  async fn get_company(&self, company_id: Uuid) -> Result<Option<Company>> {
    let id_str = encode_uuid(company_id);

    let raw: Option<RawCompany> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT company_id, name, admin_id, created_at
               FROM companies WHERE company_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawCompany {
                  company_id: row.get(0)?,
                  name:       row.get(1)?,
                  admin_id:   row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompany::into_company).transpose()
  }

  async fn company_for_admin(&self, admin_id: Uuid) -> Result<Option<Company>> {
    let admin_str = encode_uuid(admin_id);

    let raw: Option<RawCompany> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT company_id, name, admin_id, created_at
               FROM companies WHERE admin_id = ?1",
              rusqlite::params![admin_str],
              |row| {
                Ok(RawCompany {
                  company_id: row.get(0)?,
                  name:       row.get(1)?,
                  admin_id:   row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompany::into_company).transpose()
  }

  async fn list_members(&self, company_id: Uuid) -> Result<Vec<MemberView>> {
    let id_str = encode_uuid(company_id);

    let raws: Vec<RawMemberView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.membership_id, m.company_id, m.user_id, m.joined_at,
                  a.email, p.full_name
           FROM company_members m
           JOIN accounts a ON a.user_id = m.user_id
           JOIN profiles p ON p.user_id = m.user_id
           WHERE m.company_id = ?1
           ORDER BY m.joined_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawMemberView {
              membership: RawMembership {
                membership_id: row.get(0)?,
                company_id:    row.get(1)?,
                user_id:       row.get(2)?,
                joined_at:     row.get(3)?,
              },
              email:      row.get(4)?,
              full_name:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawMemberView::into_member_view)
      .collect()
  }

  // ── Invitations ───────────────────────────────────────────────────────────

  async fn create_invitation(
    &self,
    input: NewInvitation,
  ) -> Result<Invitation> {
    let invitation = Invitation {
      invitation_id: Uuid::new_v4(),
      company_id:    input.company_id,
      email:         input.email,
      created_at:    Utc::now(),
      expires_at:    input.expires_at,
      accepted_at:   None,
    };

    let id_str = encode_uuid(invitation.invitation_id);
    let hash = input.token_hash;
    let company_str = encode_uuid(invitation.company_id);
    let email = invitation.email.clone();
    let created_str = encode_dt(invitation.created_at);
    let expires_str = encode_dt(invitation.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO company_invitations
             (invitation_id, token_hash, company_id, email, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            hash,
            company_str,
            email,
            created_str,
            expires_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(invitation)
  }

  async fn get_invitation(
    &self,
    token_hash: &str,
  ) -> Result<Option<Invitation>> {
    let hash = token_hash.to_owned();

    let raw: Option<RawInvitation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT invitation_id, company_id, email, created_at,
                      expires_at, accepted_at
               FROM company_invitations WHERE token_hash = ?1",
              rusqlite::params![hash],
              invitation_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInvitation::into_invitation).transpose()
  }

  async fn accept_invitation(
    &self,
    token_hash: &str,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<AcceptOutcome> {
    let hash = token_hash.to_owned();
    let user_str = encode_uuid(user_id);
    let now_str = encode_dt(now);
    let membership_id_str = encode_uuid(Uuid::new_v4());

    let raw: RawAccept = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Compare-and-set: the stamp only lands on a row that is still
        // unaccepted and unexpired. Everything after shares the
        // transaction, so membership and consumption are all-or-nothing.
        let changed = tx.execute(
          "UPDATE company_invitations SET accepted_at = ?1
           WHERE token_hash = ?2
             AND accepted_at IS NULL AND expires_at > ?1",
          rusqlite::params![now_str, hash],
        )?;

        if changed == 0 {
          // Reload the row to say why the condition failed.
          let row: Option<(Option<String>, String)> = tx
            .query_row(
              "SELECT accepted_at, expires_at
               FROM company_invitations WHERE token_hash = ?1",
              rusqlite::params![hash],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

          tx.commit()?;
          return Ok(match row {
            None => RawAccept::NotFound,
            Some((Some(_), _)) => RawAccept::AlreadyAccepted,
            Some((None, _)) => RawAccept::Expired,
          });
        }

        let company_str: String = tx.query_row(
          "SELECT company_id FROM company_invitations WHERE token_hash = ?1",
          rusqlite::params![hash],
          |row| row.get(0),
        )?;

        // Membership is unique per (company, user); re-inviting an existing
        // member consumes the token without duplicating the row.
        tx.execute(
          "INSERT INTO company_members (membership_id, company_id, user_id, joined_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (company_id, user_id) DO NOTHING",
          rusqlite::params![membership_id_str, company_str, user_str, now_str],
        )?;

        let membership = tx.query_row(
          "SELECT membership_id, company_id, user_id, joined_at
           FROM company_members WHERE company_id = ?1 AND user_id = ?2",
          rusqlite::params![company_str, user_str],
          |row| {
            Ok(RawMembership {
              membership_id: row.get(0)?,
              company_id:    row.get(1)?,
              user_id:       row.get(2)?,
              joined_at:     row.get(3)?,
            })
          },
        )?;

        tx.commit()?;
        Ok(RawAccept::Accepted(membership))
      })
      .await?;

    Ok(match raw {
      RawAccept::Accepted(m) => AcceptOutcome::Accepted(m.into_membership()?),
      RawAccept::AlreadyAccepted => AcceptOutcome::AlreadyAccepted,
      RawAccept::Expired => AcceptOutcome::Expired,
      RawAccept::NotFound => AcceptOutcome::NotFound,
    })
  }

  // ── Courses & enrollment ──────────────────────────────────────────────────

  async fn create_course(&self, input: NewCourse) -> Result<Course> {
    let course = Course {
      course_id:     Uuid::new_v4(),
      title:         input.title,
      description:   input.description,
      instructor_id: input.instructor_id,
      price_minor:   input.price_minor,
      currency:      input.currency,
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(course.course_id);
    let title = course.title.clone();
    let description = course.description.clone();
    let instructor_str = encode_uuid(course.instructor_id);
    let price_minor = course.price_minor;
    let currency = course.currency.clone();
    let at_str = encode_dt(course.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses
             (course_id, title, description, instructor_id, price_minor,
              currency, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            title,
            description,
            instructor_str,
            price_minor,
            currency,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(course)
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    let raws: Vec<RawCourse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT course_id, title, description, instructor_id, price_minor,
                  currency, created_at
           FROM courses ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], course_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn get_course(&self, course_id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(course_id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT course_id, title, description, instructor_id,
                      price_minor, currency, created_at
               FROM courses WHERE course_id = ?1",
              rusqlite::params![id_str],
              course_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn enroll(
    &self,
    course_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Enrollment>> {
    let course_str = encode_uuid(course_id);
    let user_str = encode_uuid(user_id);
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let course_exists: bool = tx
          .query_row(
            "SELECT 1 FROM courses WHERE course_id = ?1",
            rusqlite::params![course_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !course_exists {
          return Ok(None);
        }

        // Idempotent: a second enrollment keeps the original row.
        tx.execute(
          "INSERT INTO enrollments (enrollment_id, course_id, user_id, enrolled_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (course_id, user_id) DO NOTHING",
          rusqlite::params![id_str, course_str, user_str, at_str],
        )?;

        let row = tx.query_row(
          "SELECT enrollment_id, course_id, user_id, enrolled_at,
                  progress_percent, completed_at
           FROM enrollments WHERE course_id = ?1 AND user_id = ?2",
          rusqlite::params![course_str, user_str],
          enrollment_row,
        )?;

        tx.commit()?;
        Ok(Some(row))
      })
      .await?;

    raw.map(RawEnrollment::into_enrollment).transpose()
  }

  async fn record_progress(
    &self,
    course_id: Uuid,
    user_id: Uuid,
    percent: u8,
  ) -> Result<Option<Enrollment>> {
    let course_str = encode_uuid(course_id);
    let user_str = encode_uuid(user_id);
    let now_str = encode_dt(Utc::now());

    let raw: Option<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // completed_at is stamped the first time progress hits 100 and
        // survives later updates.
        let changed = tx.execute(
          "UPDATE enrollments SET
             progress_percent = ?3,
             completed_at = CASE
               WHEN ?3 = 100 AND completed_at IS NULL THEN ?4
               ELSE completed_at
             END
           WHERE course_id = ?1 AND user_id = ?2",
          rusqlite::params![course_str, user_str, percent as i64, now_str],
        )?;

        if changed == 0 {
          return Ok(None);
        }

        let row = tx.query_row(
          "SELECT enrollment_id, course_id, user_id, enrolled_at,
                  progress_percent, completed_at
           FROM enrollments WHERE course_id = ?1 AND user_id = ?2",
          rusqlite::params![course_str, user_str],
          enrollment_row,
        )?;

        tx.commit()?;
        Ok(Some(row))
      })
      .await?;

    raw.map(RawEnrollment::into_enrollment).transpose()
  }

  async fn list_enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT enrollment_id, course_id, user_id, enrolled_at,
                  progress_percent, completed_at
           FROM enrollments WHERE user_id = ?1
           ORDER BY enrolled_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], enrollment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawEnrollment::into_enrollment)
      .collect()
  }
}

//! SQL schema for the Lectern SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// All timestamps are RFC 3339 UTC strings whose string order is
/// chronological (see `encode`) — the conditional writes in `store` rely
/// on that.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- Exactly one per account. The role column is the authorization source of
-- truth; it is written only by the administrative role endpoint.
CREATE TABLE IF NOT EXISTS profiles (
    user_id    TEXT PRIMARY KEY REFERENCES accounts(user_id),
    full_name  TEXT,
    role       TEXT NOT NULL DEFAULT 'student',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Keyed by the SHA-256 hex of the raw token; the raw value is never stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES accounts(user_id),
    issued_at  TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS one_time_tokens (
    token_hash  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES accounts(user_id),
    purpose     TEXT NOT NULL,   -- 'email_verification' | 'password_reset'
    expires_at  TEXT NOT NULL,
    consumed_at TEXT
);

CREATE TABLE IF NOT EXISTS companies (
    company_id TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    admin_id   TEXT NOT NULL REFERENCES accounts(user_id),
    created_at TEXT NOT NULL
);

-- accepted_at is terminal: stamped once by the conditional acceptance
-- write, never cleared. Rows are not deleted by any flow here.
CREATE TABLE IF NOT EXISTS company_invitations (
    invitation_id TEXT PRIMARY KEY,
    token_hash    TEXT NOT NULL UNIQUE,
    company_id    TEXT NOT NULL REFERENCES companies(company_id),
    email         TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    expires_at    TEXT NOT NULL,
    accepted_at   TEXT
);

CREATE TABLE IF NOT EXISTS company_members (
    membership_id TEXT PRIMARY KEY,
    company_id    TEXT NOT NULL REFERENCES companies(company_id),
    user_id       TEXT NOT NULL REFERENCES accounts(user_id),
    joined_at     TEXT NOT NULL,
    UNIQUE (company_id, user_id)
);

CREATE TABLE IF NOT EXISTS courses (
    course_id     TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT,
    instructor_id TEXT NOT NULL REFERENCES accounts(user_id),
    price_minor   INTEGER NOT NULL,
    currency      TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id    TEXT PRIMARY KEY,
    course_id        TEXT NOT NULL REFERENCES courses(course_id),
    user_id          TEXT NOT NULL REFERENCES accounts(user_id),
    enrolled_at      TEXT NOT NULL,
    progress_percent INTEGER NOT NULL DEFAULT 0,
    completed_at     TEXT,
    UNIQUE (course_id, user_id)
);

CREATE INDEX IF NOT EXISTS sessions_user_idx       ON sessions(user_id);
CREATE INDEX IF NOT EXISTS invitations_company_idx ON company_invitations(company_id);
CREATE INDEX IF NOT EXISTS members_company_idx     ON company_members(company_id);
CREATE INDEX IF NOT EXISTS enrollments_user_idx    ON enrollments(user_id);

PRAGMA user_version = 1;
";

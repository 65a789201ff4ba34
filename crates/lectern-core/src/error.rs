//! Error types for `lectern-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown token purpose: {0:?}")]
  UnknownTokenPurpose(String),

  #[error("progress percent out of range: {0}")]
  ProgressOutOfRange(u8),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

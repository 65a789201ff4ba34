//! Opaque token generation and at-rest hashing.
//!
//! Session, invitation, and one-time tokens all share this shape: 256 bits
//! from the OS RNG, hex on the wire, SHA-256 hex in the store. Only the
//! hash is ever persisted, so a leaked database does not leak live
//! credentials.

use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Length of a raw token in bytes (hex-encoded to 64 characters).
const TOKEN_BYTES: usize = 32;

/// Generate a fresh unguessable token.
pub fn generate_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The at-rest form of a token: lowercase SHA-256 hex.
pub fn hash_token(raw: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(raw.as_bytes());
  hex::encode(hasher.finalize())
}

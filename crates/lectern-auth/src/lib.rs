//! Authentication and authorization for Lectern, over any
//! [`lectern_core::store::PlatformStore`].
//!
//! This crate owns the security-relevant decisions: resolving a principal
//! from request credentials (always against the store, never from
//! client-held claims), the fail-closed role check, and the single-use
//! invitation token lifecycle. HTTP and storage concerns live elsewhere.

pub mod authorize;
pub mod error;
pub mod invitation;
pub mod otp;
pub mod password;
pub mod session;
pub mod token;

pub use authorize::{Decision, authorize};
pub use error::{Error, Result};
pub use invitation::{accept_invitation, issue_invitation, validate_token};
pub use session::{issue_session, resolve_principal, revoke_session};

#[cfg(test)]
mod test_support;

//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access tokens bound to a session, and refresh-token helpers.

pub mod jwt;
pub mod password;

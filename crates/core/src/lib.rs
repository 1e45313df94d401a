//! Domain logic for the hand coach backend.
//!
//! Everything in this crate is pure: no database access, no network. The
//! db, llm and api crates build on these types.

pub mod crypto;
pub mod error;
pub mod hand_parser;
pub mod hashing;
pub mod rbac;
pub mod roles;
pub mod session;
pub mod statistics;
pub mod types;

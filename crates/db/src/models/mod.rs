//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity matching the table row plus
//! the insert/update DTOs its repository accepts.

pub mod analysis;
pub mod hand;
pub mod role;
pub mod session;
pub mod statistics_cache;
pub mod user;

pub mod admin;
pub mod analysis;
pub mod auth;
pub mod hands;
pub mod monitoring;
pub mod sessions;
pub mod statistics;
pub mod users;

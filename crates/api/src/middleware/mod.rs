//! Request extractors and middleware.
//!
//! - [`auth::AuthUser`] -- the caller behind a valid Bearer token and live session.
//! - [`rbac::CurrentUser`] -- [`auth::AuthUser`] plus the loaded RBAC principal.
//! - [`rbac::RequireAdmin`] / [`rbac::RequireSuperuser`] -- account-flag gates.
//! - [`rate_limit`] -- per-client request limiting.
//! - [`request_metrics`] -- request counters and latency.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
pub mod request_metrics;

//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod analysis_repo;
pub mod hand_repo;
pub mod role_repo;
pub mod session_repo;
pub mod statistics_cache_repo;
pub mod user_repo;

pub use analysis_repo::AnalysisRepo;
pub use hand_repo::HandRepo;
pub use role_repo::{PermissionRepo, RoleRepo, UserRoleRepo};
pub use session_repo::SessionRepo;
pub use statistics_cache_repo::StatisticsCacheRepo;
pub use user_repo::UserRepo;

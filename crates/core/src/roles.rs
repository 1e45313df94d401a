//! Well-known role and permission names.
//!
//! These must match the seed data in `20261001000006_seed_rbac.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PLAYER: &str = "player";
pub const ROLE_VIEWER: &str = "viewer";

/// Role assigned to every newly registered account.
pub const DEFAULT_ROLE: &str = ROLE_PLAYER;

/// Role name placed in access-token claims for flag-based identities.
pub const CLAIM_ROLE_SUPERUSER: &str = "superuser";

/// Resource names used in `resource:action` permissions.
pub mod resources {
    pub const HANDS: &str = "hands";
    pub const STATISTICS: &str = "statistics";
    pub const ANALYSIS: &str = "analysis";
    pub const USERS: &str = "users";
    pub const SESSIONS: &str = "sessions";
    pub const ROLES: &str = "roles";
    pub const SYSTEM: &str = "system";
}

/// Action names used in `resource:action` permissions.
pub mod actions {
    pub const READ: &str = "read";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    /// Grants every action on the resource.
    pub const MANAGE: &str = "manage";
}

/// Named permissions checked directly by handlers.
pub mod permissions {
    pub const SYSTEM_READ: &str = "system:read";
    pub const SYSTEM_MANAGE: &str = "system:manage";
    pub const ROLES_MANAGE: &str = "roles:manage";
    pub const USERS_MANAGE: &str = "users:manage";
    pub const SESSIONS_MANAGE: &str = "sessions:manage";
}

/// Build the canonical `resource:action` permission name.
pub fn permission_name(resource: &str, action: &str) -> String {
    format!("{resource}:{action}")
}

//! Role, permission and role-assignment models.

use handcoach_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `roles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A row from the `permissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Permission {
    pub id: DbId,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

/// A `user_roles` row joined with the role name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRoleAssignment {
    pub id: DbId,
    pub user_id: DbId,
    pub role_id: DbId,
    pub role_name: String,
    pub assigned_by: Option<DbId>,
    pub assigned_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug)]
pub struct AssignRole {
    pub user_id: DbId,
    pub role_id: DbId,
    pub assigned_by: Option<DbId>,
    pub expires_at: Option<Timestamp>,
}

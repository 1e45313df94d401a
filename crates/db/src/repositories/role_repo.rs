//! Repositories for `roles`, `permissions`, `role_permissions` and
//! `user_roles`.

use handcoach_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::{AssignRole, CreateRole, Permission, Role, UpdateRole, UserRoleAssignment};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const COLUMNS: &str = "id, name, description, is_system, created_at, updated_at";

const PERMISSION_COLUMNS: &str = "id, name, resource, action, description";

const ASSIGNMENT_COLUMNS: &str = "\
    ur.id, ur.user_id, ur.role_id, r.name AS role_name, ur.assigned_by, \
    ur.assigned_at, ur.expires_at";

// ---------------------------------------------------------------------------
// RoleRepo
// ---------------------------------------------------------------------------

/// Provides CRUD operations for roles. System roles cannot be changed.
pub struct RoleRepo;

impl RoleRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a role by name (case-sensitive).
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all roles ordered by ID ascending.
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles ORDER BY id ASC");
        sqlx::query_as::<_, Role>(&query).fetch_all(pool).await
    }

    pub async fn create(pool: &PgPool, input: &CreateRole) -> Result<Role, sqlx::Error> {
        let query = format!(
            "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Update a custom role. Returns `None` for missing or system roles.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRole,
    ) -> Result<Option<Role>, sqlx::Error> {
        let query = format!(
            "UPDATE roles SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1 AND is_system = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a custom role. Returns `false` for missing or system roles.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1 AND is_system = false")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permissions granted by a role.
    pub async fn list_permissions(
        pool: &PgPool,
        role_id: DbId,
    ) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.name, p.resource, p.action, p.description
             FROM permissions p
             JOIN role_permissions rp ON rp.permission_id = p.id
             WHERE rp.role_id = $1
             ORDER BY p.name",
        )
        .bind(role_id)
        .fetch_all(pool)
        .await
    }

    /// Replace the permission set of a role in one transaction.
    pub async fn set_permissions(
        pool: &PgPool,
        role_id: DbId,
        permission_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id)
             SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PermissionRepo
// ---------------------------------------------------------------------------

/// Read access to the permission catalogue.
pub struct PermissionRepo;

impl PermissionRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<Permission>, sqlx::Error> {
        let query = format!("SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY name");
        sqlx::query_as::<_, Permission>(&query).fetch_all(pool).await
    }

    /// Look up permissions by `resource:action` name. Unknown names are
    /// simply absent from the result.
    pub async fn find_by_names(
        pool: &PgPool,
        names: &[String],
    ) -> Result<Vec<Permission>, sqlx::Error> {
        let query =
            format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE name = ANY($1) ORDER BY name");
        sqlx::query_as::<_, Permission>(&query)
            .bind(names)
            .fetch_all(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// UserRoleRepo
// ---------------------------------------------------------------------------

/// Role assignments and effective-permission resolution.
pub struct UserRoleRepo;

impl UserRoleRepo {
    /// Assign a role. Re-assigning refreshes `assigned_by` and `expires_at`.
    pub async fn assign(
        pool: &PgPool,
        input: &AssignRole,
    ) -> Result<UserRoleAssignment, sqlx::Error> {
        let query = format!(
            "WITH ur AS (
                INSERT INTO user_roles (user_id, role_id, assigned_by, expires_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, role_id) DO UPDATE SET
                    assigned_by = EXCLUDED.assigned_by,
                    assigned_at = NOW(),
                    expires_at = EXCLUDED.expires_at
                RETURNING *
             )
             SELECT {ASSIGNMENT_COLUMNS} FROM ur JOIN roles r ON r.id = ur.role_id"
        );
        sqlx::query_as::<_, UserRoleAssignment>(&query)
            .bind(input.user_id)
            .bind(input.role_id)
            .bind(input.assigned_by)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserRoleAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM user_roles ur
             JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = $1
             ORDER BY ur.assigned_at ASC"
        );
        sqlx::query_as::<_, UserRoleAssignment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Remove an assignment. Returns `true` if one existed.
    pub async fn remove(pool: &PgPool, user_id: DbId, role_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Union of the permission names of all non-expired assignments.
    pub async fn effective_permissions(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT p.name FROM user_roles ur
             JOIN role_permissions rp ON rp.role_id = ur.role_id
             JOIN permissions p ON p.id = rp.permission_id
             WHERE ur.user_id = $1
               AND (ur.expires_at IS NULL OR ur.expires_at > NOW())
             ORDER BY p.name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

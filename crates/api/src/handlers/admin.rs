//! RBAC administration: accounts, roles, permissions and role assignments.
//!
//! Account and assignment endpoints need `users:manage`, role endpoints
//! need `roles:manage`. Granting the superuser flag and hard deletion are
//! reserved to superusers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use handcoach_core::error::CoreError;
use handcoach_core::rbac::Requirement;
use handcoach_core::roles::permissions;
use handcoach_core::types::{DbId, Timestamp};
use handcoach_db::models::role::{AssignRole, CreateRole, Permission, Role, UpdateRole};
use handcoach_db::models::user::{AdminUpdateUser, UserResponse};
use handcoach_db::repositories::{PermissionRepo, RoleRepo, UserRepo, UserRoleRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{CurrentUser, RequireSuperuser};
use crate::query::PaginationParams;
use crate::response::{DataResponse, Page};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 2, max = 50), custom(function = "validate_role_name"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 2, max = 50), custom(function = "validate_role_name"))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPermissionsRequest {
    /// Permission names such as `hands:read`. Replaces the current set.
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: DbId,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

fn validate_role_name(name: &str) -> Result<(), validator::ValidationError> {
    let ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(validator::ValidationError::new("role_name")
            .with_message("lowercase letters, digits, '-' and '_' only".into()))
    }
}

fn system_role_immutable() -> AppError {
    AppError::Core(CoreError::Conflict("System roles cannot be modified".into()))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users
pub async fn list_users(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::USERS_MANAGE))?;

    let (limit, offset) = (params.limit(), params.offset());
    let users = UserRepo::list(&state.pool, limit, offset).await?;
    let total = UserRepo::count(&state.pool).await?;

    Ok(Json(DataResponse {
        data: Page {
            items: users.iter().map(UserResponse::from).collect(),
            total,
            limit,
            offset,
        },
    }))
}

/// PATCH /api/v1/admin/users/{id}
///
/// Change `is_active`, `is_admin` or `is_superuser`.
pub async fn update_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AdminUpdateUser>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::USERS_MANAGE))?;

    if input.is_superuser.is_some() && !current.principal.is_superuser {
        return Err(AppError::Core(CoreError::InsufficientPermission {
            required: "superuser account".into(),
        }));
    }
    if id == current.id() && input.is_active == Some(false) {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".into(),
        ));
    }

    let target = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    // Superuser accounts sit above admin authority.
    if target.is_superuser && !current.principal.is_superuser {
        return Err(AppError::Core(CoreError::InsufficientPermission {
            required: "superuser account".into(),
        }));
    }

    let user = UserRepo::admin_update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(target_user_id = id, user_id = current.id(), ?input, "User flags updated");

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Permanently delete an account and everything it owns. Superuser only.
pub async fn delete_user(
    RequireSuperuser(current): RequireSuperuser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if id == current.id() {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }

    if !UserRepo::hard_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }

    tracing::warn!(target_user_id = id, user_id = current.id(), "User hard-deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/roles
pub async fn list_roles(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::ROLES_MANAGE))?;

    let roles = RoleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// POST /api/v1/admin/roles
pub async fn create_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    current.require(Requirement::Permission(permissions::ROLES_MANAGE))?;

    let role = RoleRepo::create(
        &state.pool,
        &CreateRole {
            name: input.name,
            description: input.description,
        },
    )
    .await?;

    tracing::info!(role_id = role.id, role = %role.name, user_id = current.id(), "Role created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: role })))
}

/// GET /api/v1/admin/roles/{id}
///
/// The role with its permissions.
pub async fn get_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::ROLES_MANAGE))?;

    let role = find_role(&state, id).await?;
    let permissions = RoleRepo::list_permissions(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: RoleDetail { role, permissions },
    }))
}

/// PATCH /api/v1/admin/roles/{id}
pub async fn update_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    current.require(Requirement::Permission(permissions::ROLES_MANAGE))?;

    if find_role(&state, id).await?.is_system {
        return Err(system_role_immutable());
    }

    let role = RoleRepo::update(
        &state.pool,
        id,
        &UpdateRole {
            name: input.name,
            description: input.description,
        },
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Role", id }))?;

    tracing::info!(role_id = id, user_id = current.id(), "Role updated");

    Ok(Json(DataResponse { data: role }))
}

/// DELETE /api/v1/admin/roles/{id}
pub async fn delete_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::ROLES_MANAGE))?;

    if find_role(&state, id).await?.is_system {
        return Err(system_role_immutable());
    }
    if !RoleRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Role", id }));
    }

    tracing::info!(role_id = id, user_id = current.id(), "Role deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/admin/roles/{id}/permissions
///
/// Replace the permission set of a custom role. Unknown names are rejected.
pub async fn set_role_permissions(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetPermissionsRequest>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::ROLES_MANAGE))?;

    if find_role(&state, id).await?.is_system {
        return Err(system_role_immutable());
    }

    let mut names = input.permissions;
    names.sort();
    names.dedup();

    let found = PermissionRepo::find_by_names(&state.pool, &names).await?;
    if found.len() != names.len() {
        let unknown: Vec<&str> = names
            .iter()
            .filter(|n| !found.iter().any(|p| &p.name == *n))
            .map(String::as_str)
            .collect();
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown permissions: {}",
            unknown.join(", ")
        ))));
    }

    let ids: Vec<DbId> = found.iter().map(|p| p.id).collect();
    RoleRepo::set_permissions(&state.pool, id, &ids).await?;

    tracing::info!(role_id = id, count = ids.len(), user_id = current.id(), "Role permissions replaced");

    let permissions = RoleRepo::list_permissions(&state.pool, id).await?;
    Ok(Json(DataResponse { data: permissions }))
}

/// GET /api/v1/admin/permissions
pub async fn list_permissions(
    current: CurrentUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::ROLES_MANAGE))?;

    let all = PermissionRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: all }))
}

// ---------------------------------------------------------------------------
// Role assignments
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users/{id}/roles
pub async fn list_user_roles(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::USERS_MANAGE))?;

    ensure_user_exists(&state, user_id).await?;
    let assignments = UserRoleRepo::list_for_user(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: assignments }))
}

/// POST /api/v1/admin/users/{id}/roles
///
/// Assign a role, optionally until `expires_at`. Re-assigning refreshes
/// the expiry.
pub async fn assign_user_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<AssignRoleRequest>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::USERS_MANAGE))?;

    ensure_user_exists(&state, user_id).await?;
    find_role(&state, input.role_id).await?;

    let assignment = UserRoleRepo::assign(
        &state.pool,
        &AssignRole {
            user_id,
            role_id: input.role_id,
            assigned_by: Some(current.id()),
            expires_at: input.expires_at,
        },
    )
    .await?;

    tracing::info!(
        target_user_id = user_id,
        role_id = input.role_id,
        user_id = current.id(),
        "Role assigned",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: assignment })))
}

/// DELETE /api/v1/admin/users/{id}/roles/{role_id}
pub async fn remove_user_role(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((user_id, role_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::USERS_MANAGE))?;

    if !UserRoleRepo::remove(&state.pool, user_id, role_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "RoleAssignment",
            id: role_id,
        }));
    }

    tracing::info!(target_user_id = user_id, role_id, user_id = current.id(), "Role removed");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/users/{id}/permissions
///
/// Effective permission names from all non-expired assignments.
pub async fn user_permissions(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    current.require(Requirement::Permission(permissions::USERS_MANAGE))?;

    ensure_user_exists(&state, user_id).await?;
    let names = UserRoleRepo::effective_permissions(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: names }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_role(state: &AppState, id: DbId) -> AppResult<Role> {
    RoleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Role", id }))
}

async fn ensure_user_exists(state: &AppState, id: DbId) -> AppResult<()> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .map(|_| ())
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

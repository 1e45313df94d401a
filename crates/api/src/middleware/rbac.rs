//! Role-based access control extractors.
//!
//! [`CurrentUser`] loads the caller's account flags and effective
//! permissions into a [`Principal`]; handlers then state what they need
//! with [`CurrentUser::require`]. The flag-only gates [`RequireAdmin`] and
//! [`RequireSuperuser`] reject at extraction time.

use std::collections::HashSet;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use handcoach_core::error::CoreError;
use handcoach_core::rbac::{authorize, Principal, Requirement};
use handcoach_core::types::DbId;
use handcoach_db::models::user::User;
use handcoach_db::repositories::{UserRepo, UserRoleRepo};

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The authenticated caller with their RBAC principal.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub auth: AuthUser,
    pub user: User,
    pub principal: Principal,
}

impl CurrentUser {
    pub fn id(&self) -> DbId {
        self.auth.user_id
    }

    /// Fail with `insufficient-permission` unless `requirement` holds.
    pub fn require(&self, requirement: Requirement<'_>) -> AppResult<()> {
        authorize(&self.principal, requirement).map_err(AppError::Core)
    }

    /// `resource:action` on a resource owned by `owner_id`.
    pub fn require_owned(&self, resource: &str, action: &str, owner_id: DbId) -> AppResult<()> {
        self.require(Requirement::Resource {
            resource,
            action,
            owner_id: Some(owner_id),
        })
    }

    /// `resource:action` on the caller's own data.
    pub fn require_own(&self, resource: &str, action: &str) -> AppResult<()> {
        self.require_owned(resource, action, self.id())
    }
}

/// Build the principal for `user` from its flags and role assignments.
pub async fn load_principal(state: &AppState, user: &User) -> AppResult<Principal> {
    let permissions: HashSet<String> = UserRoleRepo::effective_permissions(&state.pool, user.id)
        .await?
        .into_iter()
        .collect();

    Ok(Principal {
        user_id: user.id,
        is_active: user.is_active && user.deleted_at.is_none(),
        is_admin: user.is_admin,
        is_superuser: user.is_superuser,
        permissions,
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let user = UserRepo::find_by_id(&state.pool, auth.user_id)
            .await?
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("User no longer exists".into()))
            })?;
        let principal = load_principal(state, &user).await?;

        Ok(CurrentUser {
            auth,
            user,
            principal,
        })
    }
}

/// Requires an active admin or superuser account.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        current.require(Requirement::ActiveAccount)?;
        if !current.principal.bypasses_ownership() {
            return Err(AppError::Core(CoreError::InsufficientPermission {
                required: "admin account".into(),
            }));
        }
        Ok(RequireAdmin(current))
    }
}

/// Requires an active superuser account.
pub struct RequireSuperuser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireSuperuser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        current.require(Requirement::ActiveAccount)?;
        if !current.principal.is_superuser {
            return Err(AppError::Core(CoreError::InsufficientPermission {
                required: "superuser account".into(),
            }));
        }
        Ok(RequireSuperuser(current))
    }
}

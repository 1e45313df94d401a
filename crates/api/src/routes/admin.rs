use axum::routing::{delete, get, patch, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// RBAC administration routes mounted at `/admin`.
///
/// ```text
/// GET    /users                           -> list_users
/// PATCH  /users/{id}                      -> update_user
/// DELETE /users/{id}                      -> delete_user (superuser only)
/// GET    /users/{id}/roles                -> list_user_roles
/// POST   /users/{id}/roles                -> assign_user_role
/// DELETE /users/{id}/roles/{role_id}      -> remove_user_role
/// GET    /users/{id}/permissions          -> user_permissions
/// GET    /roles                           -> list_roles
/// POST   /roles                           -> create_role
/// GET    /roles/{id}                      -> get_role
/// PATCH  /roles/{id}                      -> update_role
/// DELETE /roles/{id}                      -> delete_role
/// PUT    /roles/{id}/permissions          -> set_role_permissions
/// GET    /permissions                     -> list_permissions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            patch(admin::update_user).delete(admin::delete_user),
        )
        .route(
            "/users/{id}/roles",
            get(admin::list_user_roles).post(admin::assign_user_role),
        )
        .route(
            "/users/{id}/roles/{role_id}",
            delete(admin::remove_user_role),
        )
        .route("/users/{id}/permissions", get(admin::user_permissions))
        .route("/roles", get(admin::list_roles).post(admin::create_role))
        .route(
            "/roles/{id}",
            get(admin::get_role)
                .patch(admin::update_role)
                .delete(admin::delete_role),
        )
        .route("/roles/{id}/permissions", put(admin::set_role_permissions))
        .route("/permissions", get(admin::list_permissions))
}

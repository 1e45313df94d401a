//! User entity model and DTOs.

use std::collections::BTreeMap;

use handcoach_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// Full user row from the `users` table.
///
/// Contains the password hash and encrypted provider keys -- NEVER
/// serialize this to API responses directly. Use [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    /// Provider name -> hex ciphertext.
    pub api_keys: Json<BTreeMap<String, String>>,
    pub preferences: serde_json::Value,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_superuser: bool,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// Safe user representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_superuser: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
            is_admin: user.is_admin,
            is_superuser: user.is_superuser,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
}

/// Account flags an administrator may change. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUser {
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub is_superuser: Option<bool>,
}

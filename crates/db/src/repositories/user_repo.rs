//! Repository for the `users` table.

use handcoach_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{AdminUpdateUser, CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, full_name, api_keys, preferences, \
                        is_active, is_admin, is_superuser, failed_login_count, locked_until, \
                        last_login_at, created_at, updated_at, deleted_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user and assign `role_name` in one transaction.
    pub async fn create_with_role(
        pool: &PgPool,
        input: &CreateUser,
        role_name: &str,
    ) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO users (email, password_hash, full_name)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.full_name)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = $2",
        )
        .bind(user.id)
        .bind(role_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List users, most recently created first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    /// Update the display name. Returns `None` if the user does not exist.
    pub async fn update_full_name(
        pool: &PgPool,
        id: DbId,
        full_name: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("UPDATE users SET full_name = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(full_name)
            .fetch_optional(pool)
            .await
    }

    /// Apply administrator flag changes. Only non-`None` fields are applied.
    pub async fn admin_update(
        pool: &PgPool,
        id: DbId,
        input: &AdminUpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                is_active = COALESCE($2, is_active),
                is_admin = COALESCE($3, is_admin),
                is_superuser = COALESCE($4, is_superuser)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(input.is_active)
            .bind(input.is_admin)
            .bind(input.is_superuser)
            .fetch_optional(pool)
            .await
    }

    /// Close an account: deactivate, stamp `deleted_at`, scrub stored keys
    /// and end every active session.
    ///
    /// Returns `true` if the account was active.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET
                is_active = false,
                deleted_at = NOW(),
                api_keys = '{}'::jsonb
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE user_sessions SET is_active = false, ended_at = NOW(), end_reason = 'ended'
             WHERE user_id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently remove a user and everything they own.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Increment the failed login counter by 1, returning the new value.
    ///
    /// A lock that has already expired is cleared and counting restarts
    /// from this failure.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE users SET
                failed_login_count = CASE
                    WHEN locked_until IS NOT NULL AND locked_until <= NOW() THEN 1
                    ELSE failed_login_count + 1
                END,
                locked_until = CASE
                    WHEN locked_until IS NOT NULL AND locked_until <= NOW() THEN NULL
                    ELSE locked_until
                END
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Lock a user account until the specified timestamp.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset `failed_login_count` to 0, clear
    /// `locked_until`, and set `last_login_at` to now.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Shallow JSON merge of `patch` into the stored preferences. Top-level
    /// keys set to `null` in the patch are removed; nulls nested inside a
    /// value are stored as given.
    pub async fn merge_preferences(
        pool: &PgPool,
        id: DbId,
        patch: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar::<_, serde_json::Value>(
            "UPDATE users SET preferences = (preferences || $2)
                - ARRAY(SELECT key FROM jsonb_each($2) WHERE value = 'null'::jsonb)
             WHERE id = $1
             RETURNING preferences",
        )
        .bind(id)
        .bind(patch)
        .fetch_optional(pool)
        .await
    }

    /// Store (or replace) the encrypted key for `provider`.
    pub async fn set_api_key(
        pool: &PgPool,
        id: DbId,
        provider: &str,
        ciphertext: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET api_keys = api_keys || jsonb_build_object($2::text, $3::text)
             WHERE id = $1",
        )
        .bind(id)
        .bind(provider)
        .bind(ciphertext)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove the stored key for `provider`. Returns `true` if one existed.
    pub async fn remove_api_key(
        pool: &PgPool,
        id: DbId,
        provider: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET api_keys = api_keys - $2::text
             WHERE id = $1 AND api_keys ? $2::text",
        )
        .bind(id)
        .bind(provider)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

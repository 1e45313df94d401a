use chrono::{Duration, Utc};
use handcoach_core::session::timeout_cutoff;
use handcoach_core::types::DbId;
use handcoach_db::models::session::CreateSession;
use handcoach_db::models::user::CreateUser;
use handcoach_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

async fn seed_user(pool: &PgPool) -> DbId {
    let input = CreateUser {
        email: "sessions@example.com".to_string(),
        password_hash: "x".to_string(),
        full_name: None,
    };
    UserRepo::create_with_role(pool, &input, "player")
        .await
        .unwrap()
        .id
}

async fn seed_session(pool: &PgPool, user_id: DbId, token: &str, idle_mins: i64) -> DbId {
    let session = SessionRepo::create(
        pool,
        &CreateSession {
            user_id,
            refresh_token_hash: token.to_string(),
            timezone: None,
            device_info: None,
            ip_address: None,
            expires_at: Utc::now() + Duration::days(7),
        },
    )
    .await
    .unwrap();

    sqlx::query("UPDATE user_sessions SET last_activity_at = NOW() - make_interval(mins => $2) WHERE id = $1")
        .bind(session.id)
        .bind(idle_mins as i32)
        .execute(pool)
        .await
        .unwrap();
    session.id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_end_inactive_ends_exactly_stale_sessions(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let fresh = seed_session(&pool, user_id, "fresh", 5).await;
    let borderline = seed_session(&pool, user_id, "borderline", 55).await;
    let stale = seed_session(&pool, user_id, "stale", 90).await;
    let very_stale = seed_session(&pool, user_id, "very-stale", 600).await;

    let cutoff = timeout_cutoff(Utc::now(), Duration::minutes(60));
    let ended = SessionRepo::end_inactive(&pool, cutoff).await.unwrap();
    assert_eq!(ended, 2);

    for id in [fresh, borderline] {
        let s = SessionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert!(s.is_active);
        assert!(s.ended_at.is_none());
    }
    for id in [stale, very_stale] {
        let s = SessionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
        assert!(!s.is_active);
        assert_eq!(s.end_reason.as_deref(), Some("timeout"));
        assert!(s.ended_at.is_some());
    }

    // Already-ended sessions are not counted again.
    assert_eq!(SessionRepo::end_inactive(&pool, cutoff).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rotate_refresh_token_keeps_row(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let id = seed_session(&pool, user_id, "old-hash", 0).await;

    let rotated = SessionRepo::rotate_refresh_token(&pool, id, "new-hash", Utc::now() + Duration::days(7))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rotated.id, id);

    assert!(SessionRepo::find_by_refresh_token_hash(&pool, "old-hash")
        .await
        .unwrap()
        .is_none());
    assert!(SessionRepo::find_by_refresh_token_hash(&pool, "new-hash")
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ended_session_cannot_be_touched(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let id = seed_session(&pool, user_id, "hash", 0).await;

    assert!(SessionRepo::end(&pool, id, "logout").await.unwrap());
    assert!(!SessionRepo::end(&pool, id, "logout").await.unwrap());
    assert!(SessionRepo::touch(&pool, id, Some("UTC")).await.unwrap().is_none());
    assert_eq!(SessionRepo::count_active(&pool).await.unwrap(), 0);
}

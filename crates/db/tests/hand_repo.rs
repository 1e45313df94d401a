use handcoach_core::hand_parser::parse_file;
use handcoach_core::types::DbId;
use chrono::{Duration, Utc};
use handcoach_db::models::hand::{HandFilter, NewPokerHand};
use handcoach_db::models::statistics_cache::UpsertStatisticsCache;
use handcoach_db::models::user::CreateUser;
use handcoach_db::repositories::{HandRepo, StatisticsCacheRepo, UserRepo};
use sqlx::PgPool;

const HAND: &str = "\
PokerStars Hand #777: Hold'em No Limit ($0.05/$0.10 USD) - 2026/09/01 18:00:00 ET
Table 'Beta' 6-max Seat #2 is the button
Seat 1: Hero ($10.00 in chips)
Seat 2: Villain ($10.00 in chips)
Villain: posts small blind $0.05
Hero: posts big blind $0.10
*** HOLE CARDS ***
Dealt to Hero [As Ac]
Villain: raises $0.20 to $0.30
Hero: calls $0.20
*** FLOP *** [2d 3d 4d]
Villain: bets $0.40
Hero: folds
Uncalled bet ($0.40) returned to Villain
Villain collected $0.60 from pot
*** SUMMARY ***
Total pot $0.60 | Rake $0
";

async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    let input = CreateUser {
        email: email.to_string(),
        password_hash: "x".to_string(),
        full_name: None,
    };
    UserRepo::create_with_role(pool, &input, "player")
        .await
        .unwrap()
        .id
}

fn parsed() -> Vec<NewPokerHand> {
    parse_file(HAND)
        .hands
        .iter()
        .map(NewPokerHand::from_parsed)
        .collect()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_hand_is_skipped_per_user(pool: PgPool) {
    let alice = seed_user(&pool, "alice@example.com").await;
    let bob = seed_user(&pool, "bob@example.com").await;
    let hands = parsed();

    assert_eq!(HandRepo::insert_many(&pool, alice, &hands).await.unwrap().len(), 1);
    assert!(HandRepo::insert_many(&pool, alice, &hands).await.unwrap().is_empty());
    // Same natural id for another owner is a different hand.
    assert_eq!(HandRepo::insert_many(&pool, bob, &hands).await.unwrap().len(), 1);

    let filter = HandFilter::default();
    assert_eq!(HandRepo::count(&pool, alice, &filter).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_filters_and_stats_rows(pool: PgPool) {
    let user = seed_user(&pool, "filters@example.com").await;
    HandRepo::insert_many(&pool, user, &parsed()).await.unwrap();

    let by_platform = HandFilter {
        platform: Some("ggpoker".to_string()),
        ..Default::default()
    };
    assert_eq!(HandRepo::count(&pool, user, &by_platform).await.unwrap(), 0);

    let by_position = HandFilter {
        position: Some("BB".to_string()),
        ..Default::default()
    };
    let hands = HandRepo::list(&pool, user, &by_position, 10, 0).await.unwrap();
    assert_eq!(hands.len(), 1);
    assert_eq!(hands[0].result, "folded");
    assert_eq!(hands[0].net_profit, -0.3);

    let rows = HandRepo::list_stats_rows(&pool, user, &HandFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_vpip);
}

async fn seed_cache(pool: &PgPool, user_id: DbId) {
    StatisticsCacheRepo::upsert(
        pool,
        &UpsertStatisticsCache {
            user_id,
            cache_key: "summary".to_string(),
            filters: serde_json::json!({}),
            metrics: serde_json::json!({ "total_hands": 0 }),
            valid_until: Utc::now() + Duration::hours(1),
        },
    )
    .await
    .unwrap();
}

async fn is_cached(pool: &PgPool, user_id: DbId) -> bool {
    StatisticsCacheRepo::find_valid(pool, user_id, "summary")
        .await
        .unwrap()
        .is_some()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_clears_cache_only_when_rows_are_added(pool: PgPool) {
    let user = seed_user(&pool, "insert-cache@example.com").await;
    let hands = parsed();

    seed_cache(&pool, user).await;
    HandRepo::insert_many(&pool, user, &hands).await.unwrap();
    assert!(!is_cached(&pool, user).await);

    // A re-upload of the same hand changes nothing.
    seed_cache(&pool, user).await;
    HandRepo::insert_many(&pool, user, &hands).await.unwrap();
    assert!(is_cached(&pool, user).await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reparse_clears_owner_cache(pool: PgPool) {
    let user = seed_user(&pool, "reparse-cache@example.com").await;
    let other = seed_user(&pool, "bystander@example.com").await;
    let hands = parsed();
    let id = HandRepo::insert_many(&pool, user, &hands).await.unwrap()[0];

    seed_cache(&pool, user).await;
    seed_cache(&pool, other).await;

    let updated = HandRepo::update_parsed(&pool, id, &hands[0]).await.unwrap();
    assert!(updated.is_some());
    assert!(!is_cached(&pool, user).await);
    assert!(is_cached(&pool, other).await);

    // Unknown hand: nothing written, nothing cleared.
    seed_cache(&pool, user).await;
    assert!(HandRepo::update_parsed(&pool, id + 1000, &hands[0]).await.unwrap().is_none());
    assert!(is_cached(&pool, user).await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_clears_owner_cache(pool: PgPool) {
    let user = seed_user(&pool, "delete-cache@example.com").await;
    let id = HandRepo::insert_many(&pool, user, &parsed()).await.unwrap()[0];

    seed_cache(&pool, user).await;
    assert!(HandRepo::delete(&pool, id).await.unwrap());
    assert!(!is_cached(&pool, user).await);
    assert_eq!(HandRepo::count(&pool, user, &HandFilter::default()).await.unwrap(), 0);

    seed_cache(&pool, user).await;
    assert!(!HandRepo::delete(&pool, id).await.unwrap());
    assert!(is_cached(&pool, user).await);
}

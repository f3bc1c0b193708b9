//! Postgres-backed tests for the `videos` table operations.
//!
//! Each test gets its own migrated database via `#[sqlx::test]`.

use bmdb_core::IngestRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

fn record(brand: &str, video_id: &str, views: i64, likes: i64, comments: i64) -> IngestRecord {
    let published_at: DateTime<Utc> = "2025-06-01T09:30:15Z".parse().expect("timestamp");
    let (published_date, published_time) = IngestRecord::split_published_at(published_at);
    #[allow(clippy::cast_sign_loss)]
    let engagement_rate = bmdb_core::engagement_rate(views as u64, likes as u64, comments as u64);
    IngestRecord {
        brand: brand.to_string(),
        channel_id: format!("UC-{brand}"),
        channel_name: format!("{brand} Official"),
        channel_subscribers: 1_000_000,
        video_id: video_id.to_string(),
        video_title: format!("video {video_id}"),
        published_at,
        view_count: views,
        like_count: likes,
        comment_count: comments,
        engagement_rate,
        duration: "PT5M30S".to_string(),
        tags: "makeup,summer".to_string(),
        category_id: "26".to_string(),
        published_date,
        published_time,
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_inserts_then_replaces_in_place(pool: sqlx::PgPool) {
    let first = record("3CE", "vid-1", 1_000, 40, 10);
    bmdb_db::upsert_video(&pool, &first).await.expect("insert");

    let row = bmdb_db::get_video(&pool, "vid-1").await.expect("fetch");
    assert_eq!(row.view_count, 1_000);
    assert_eq!(row.engagement_rate, dec("5.00"));

    // A later crawl sees fresher counters for the same video.
    let second = record("3CE", "vid-1", 2_000, 100, 0);
    bmdb_db::upsert_video(&pool, &second).await.expect("upsert");

    let row = bmdb_db::get_video(&pool, "vid-1").await.expect("fetch");
    assert_eq!(row.view_count, 2_000);
    assert_eq!(row.like_count, 100);
    assert_eq!(row.engagement_rate, dec("5.00"));

    let count = bmdb_db::count_videos(&pool).await.expect("count");
    assert_eq!(count, 1, "upsert must replace, not duplicate");
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_video_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = bmdb_db::get_video(&pool, "missing").await;
    assert!(matches!(result, Err(bmdb_db::DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_videos_orders_newest_first(pool: sqlx::PgPool) {
    let mut old = record("CLIO", "vid-old", 10, 1, 0);
    old.published_at = "2025-01-01T00:00:00Z".parse().expect("timestamp");
    (old.published_date, old.published_time) = IngestRecord::split_published_at(old.published_at);
    let newer = record("CLIO", "vid-new", 20, 2, 0);

    bmdb_db::upsert_video(&pool, &old).await.expect("insert");
    bmdb_db::upsert_video(&pool, &newer).await.expect("insert");

    let rows = bmdb_db::list_videos(&pool, 50, 0).await.expect("list");
    let ids: Vec<&str> = rows.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, ["vid-new", "vid-old"]);

    let paged = bmdb_db::list_videos(&pool, 1, 1).await.expect("list");
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].video_id, "vid-old");
}

#[sqlx::test(migrations = "../../migrations")]
async fn replace_all_videos_resets_prior_contents(pool: sqlx::PgPool) {
    bmdb_db::upsert_video(&pool, &record("ETUDE", "vid-stale", 5, 0, 0))
        .await
        .expect("seed");

    let fresh = vec![
        record("3CE", "vid-a", 1_000, 40, 10),
        record("3CE", "vid-b", 500, 10, 5),
    ];
    bmdb_db::replace_all_videos(&pool, &fresh)
        .await
        .expect("replace");

    let count = bmdb_db::count_videos(&pool).await.expect("count");
    assert_eq!(count, 2);
    let result = bmdb_db::get_video(&pool, "vid-stale").await;
    assert!(
        matches!(result, Err(bmdb_db::DbError::NotFound)),
        "stale rows must be gone after a replace"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn brand_stats_aggregates_per_brand(pool: sqlx::PgPool) {
    // 3CE: rates 5.00 and 3.00 → avg 4.00
    bmdb_db::upsert_video(&pool, &record("3CE", "vid-1", 1_000, 40, 10))
        .await
        .expect("insert");
    bmdb_db::upsert_video(&pool, &record("3CE", "vid-2", 1_000, 20, 10))
        .await
        .expect("insert");
    // CLIO: a single zero-view video → avg 0.00
    bmdb_db::upsert_video(&pool, &record("CLIO", "vid-3", 0, 99, 99))
        .await
        .expect("insert");

    let stats = bmdb_db::brand_stats(&pool).await.expect("aggregate");
    assert_eq!(stats.len(), 2);

    let three_ce = &stats[0];
    assert_eq!(three_ce.brand, "3CE");
    assert_eq!(three_ce.total_views, 2_000);
    assert_eq!(three_ce.total_likes, 60);
    assert_eq!(three_ce.avg_engagement, dec("4.00"));
    assert_eq!(three_ce.video_count, 2);

    let clio = &stats[1];
    assert_eq!(clio.brand, "CLIO");
    assert_eq!(clio.total_views, 0);
    assert_eq!(clio.avg_engagement, dec("0.00"));
    assert_eq!(clio.video_count, 1);
}

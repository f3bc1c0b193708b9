//! Database operations for the `videos` table.

use bmdb_core::IngestRecord;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `videos` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoRow {
    pub video_id: String,
    pub brand: String,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_subscribers: i64,
    pub video_title: String,
    pub published_at: DateTime<Utc>,
    pub published_date: NaiveDate,
    pub published_time: NaiveTime,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub engagement_rate: Decimal,
    pub duration: String,
    pub tags: String,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-brand aggregates for the dashboard, one row per brand.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandStatsRow {
    pub brand: String,
    pub total_views: i64,
    pub total_likes: i64,
    pub avg_engagement: Decimal,
    pub video_count: i64,
}

const UPSERT_SQL: &str = "INSERT INTO videos \
     (video_id, brand, channel_id, channel_name, channel_subscribers, \
      video_title, published_at, published_date, published_time, \
      view_count, like_count, comment_count, engagement_rate, \
      duration, tags, category_id) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
     ON CONFLICT (video_id) DO UPDATE SET \
         brand               = EXCLUDED.brand, \
         channel_id          = EXCLUDED.channel_id, \
         channel_name        = EXCLUDED.channel_name, \
         channel_subscribers = EXCLUDED.channel_subscribers, \
         video_title         = EXCLUDED.video_title, \
         published_at        = EXCLUDED.published_at, \
         published_date      = EXCLUDED.published_date, \
         published_time      = EXCLUDED.published_time, \
         view_count          = EXCLUDED.view_count, \
         like_count          = EXCLUDED.like_count, \
         comment_count       = EXCLUDED.comment_count, \
         engagement_rate     = EXCLUDED.engagement_rate, \
         duration            = EXCLUDED.duration, \
         tags                = EXCLUDED.tags, \
         category_id         = EXCLUDED.category_id, \
         updated_at          = NOW()";

fn bind_record<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    record: &'q IngestRecord,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&record.video_id)
        .bind(&record.brand)
        .bind(&record.channel_id)
        .bind(&record.channel_name)
        .bind(record.channel_subscribers)
        .bind(&record.video_title)
        .bind(record.published_at)
        .bind(record.published_date)
        .bind(record.published_time)
        .bind(record.view_count)
        .bind(record.like_count)
        .bind(record.comment_count)
        .bind(record.engagement_rate)
        .bind(&record.duration)
        .bind(&record.tags)
        .bind(&record.category_id)
}

/// Inserts or replaces the row for a video (upsert-by-replace keyed on
/// `video_id`). A full re-crawl calls this once per assembled record.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_video(pool: &PgPool, record: &IngestRecord) -> Result<(), DbError> {
    bind_record(sqlx::query(UPSERT_SQL), record)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replaces the entire table contents with `records` in one transaction —
/// the bulk loader's reset-and-fill semantics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the truncate or any insert fails; the
/// transaction rolls back and prior contents stay intact.
pub async fn replace_all_videos(pool: &PgPool, records: &[IngestRecord]) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("TRUNCATE videos").execute(&mut *tx).await?;
    for record in records {
        bind_record(sqlx::query(UPSERT_SQL), record)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Returns rows ordered by publish time, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_videos(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<VideoRow>, DbError> {
    let rows = sqlx::query_as::<_, VideoRow>(
        "SELECT video_id, brand, channel_id, channel_name, channel_subscribers, \
                video_title, published_at, published_date, published_time, \
                view_count, like_count, comment_count, engagement_rate, \
                duration, tags, category_id, created_at, updated_at \
         FROM videos \
         ORDER BY published_at DESC, video_id \
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single row by `video_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_video(pool: &PgPool, video_id: &str) -> Result<VideoRow, DbError> {
    let row = sqlx::query_as::<_, VideoRow>(
        "SELECT video_id, brand, channel_id, channel_name, channel_subscribers, \
                video_title, published_at, published_date, published_time, \
                view_count, like_count, comment_count, engagement_rate, \
                duration, tags, category_id, created_at, updated_at \
         FROM videos \
         WHERE video_id = $1",
    )
    .bind(video_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the total row count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_videos(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Per-brand dashboard aggregation: total views, total likes, average
/// engagement (two decimals), and video count, ordered by brand name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn brand_stats(pool: &PgPool) -> Result<Vec<BrandStatsRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandStatsRow>(
        "SELECT brand, \
                SUM(view_count)::BIGINT AS total_views, \
                SUM(like_count)::BIGINT AS total_likes, \
                ROUND(AVG(engagement_rate), 2) AS avg_engagement, \
                COUNT(video_id) AS video_count \
         FROM videos \
         GROUP BY brand \
         ORDER BY brand",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

//! HTTP API for the engagement dashboard.
//!
//! Serves the rows produced by the crawler: a paginated video listing and
//! the per-brand aggregation the dashboard charts are built from. The
//! aggregation endpoint is memoized in a TTL cache held in [`AppState`].

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::cache::TtlCache;
use crate::middleware::{request_id, RequestId};

/// Cache key for the parameterless dashboard aggregation.
const STATS_CACHE_KEY: &str = "dashboard-stats";

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    stats_cache: TtlCache<String, Vec<BrandStatsItem>>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, stats_ttl: Duration) -> Self {
        Self {
            pool,
            stats_cache: TtlCache::new(stats_ttl),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

/// A video row as served to the dashboard.
#[derive(Debug, Serialize)]
pub(crate) struct VideoListItem {
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
}

impl From<bmdb_db::VideoRow> for VideoListItem {
    fn from(row: bmdb_db::VideoRow) -> Self {
        Self {
            video_id: row.video_id,
            brand: row.brand,
            channel_id: row.channel_id,
            channel_name: row.channel_name,
            channel_subscribers: row.channel_subscribers,
            video_title: row.video_title,
            published_at: row.published_at,
            published_date: row.published_date,
            published_time: row.published_time,
            view_count: row.view_count,
            like_count: row.like_count,
            comment_count: row.comment_count,
            engagement_rate: row.engagement_rate,
            duration: row.duration,
            tags: row.tags,
            category_id: row.category_id,
        }
    }
}

/// One aggregated row per brand, the chart data for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BrandStatsItem {
    pub brand: String,
    pub total_views: i64,
    pub total_likes: i64,
    pub avg_engagement: Decimal,
    pub video_count: i64,
}

impl From<bmdb_db::BrandStatsRow> for BrandStatsItem {
    fn from(row: bmdb_db::BrandStatsRow) -> Self {
        Self {
            brand: row.brand,
            total_views: row.total_views,
            total_likes: row.total_likes,
            avg_engagement: row.avg_engagement,
            video_count: row.video_count,
        }
    }
}

fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

fn map_db_error(request_id: String, error: &bmdb_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/videos", get(list_videos))
        .route("/api/v1/dashboard/stats", get(dashboard_stats))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct VideoListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_videos(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<VideoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = normalize_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let rows = bmdb_db::list_videos(&state.pool, limit, offset)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let items: Vec<VideoListItem> = rows.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse {
        data: items,
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let key = STATS_CACHE_KEY.to_string();
    if let Some(items) = state.stats_cache.get(&key).await {
        return Ok(Json(ApiResponse {
            data: items,
            meta: ResponseMeta::new(req_id.0),
        }));
    }

    let rows = bmdb_db::brand_stats(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let items: Vec<BrandStatsItem> = rows.into_iter().map(Into::into).collect();
    state.stats_cache.insert(key, items.clone()).await;

    Ok(Json(ApiResponse {
        data: items,
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match bmdb_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

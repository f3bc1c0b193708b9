//! `YouTube` Data API v3 response types and their normalized forms.
//!
//! Every list endpoint wraps its results in an `items` array. Counter fields
//! under `statistics` arrive as JSON strings, and are omitted entirely for
//! channels that hide them; [`count`] normalizes string/number/null/absent
//! to a plain integer so nothing downstream sees an absent counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Deserializes a counter that may be a JSON string, a number, null, or
/// absent (absent is handled by `#[serde(default)]` on the field).
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Raw::Num(n)) => Ok(n),
        Some(Raw::Str(s)) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// search.list
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchSnippet {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// channels.list
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelItem {
    pub id: String,
    pub snippet: ChannelSnippet,
    #[serde(default)]
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChannelStatistics {
    #[serde(default, deserialize_with = "count")]
    pub subscriber_count: u64,
    #[serde(default, deserialize_with = "count")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "count")]
    pub video_count: u64,
}

// ---------------------------------------------------------------------------
// videos.list
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoItem {
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default)]
    pub content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoStatistics {
    #[serde(default, deserialize_with = "count")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "count")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "count")]
    pub comment_count: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContentDetails {
    #[serde(default)]
    pub duration: String,
}

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// The `{"error": {...}}` body the API returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Normalized forms returned to callers
// ---------------------------------------------------------------------------

/// Channel-level snapshot at crawl time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    pub channel_id: String,
    pub channel_name: String,
    pub subscriber_count: u64,
    pub total_view_count: u64,
    pub total_video_count: u64,
    pub description: String,
    pub channel_published_at: Option<DateTime<Utc>>,
}

/// A video surfaced by the recent-uploads listing, in publish-date
/// descending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub description: String,
}

/// Full per-video statistics from the batched detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetail {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// ISO-8601 duration as reported by the API, e.g. `PT5M30S`.
    pub duration: String,
    pub tags: Vec<String>,
    pub category_id: String,
}

//! HTTP client for the `YouTube` Data API v3.
//!
//! Wraps `reqwest` with API key management, typed response deserialization,
//! shared request pacing, and retry with exponential back-off on transient
//! faults. Lookups that come back empty are surfaced as `Ok(None)` / an
//! empty `Vec` — a normal outcome, not an error.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode, Url};

use crate::error::YouTubeError;
use crate::pacer::Pacer;
use crate::retry::{retry_api_call, RetryPolicy};
use crate::types::{
    ChannelListResponse, ChannelStats, ErrorEnvelope, SearchListResponse, VideoDetail,
    VideoListResponse, VideoSummary,
};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Maximum video ids the `videos.list` endpoint accepts per call.
const MAX_IDS_PER_CALL: usize = 50;

/// Maximum results the `search.list` endpoint returns per page.
const MAX_PAGE_SIZE: usize = 50;

/// Maximum search pages to follow before giving up.
/// Guards against a cycling page token.
const MAX_PAGES: usize = 20;

/// Client for the `YouTube` Data API v3.
///
/// Manages the HTTP client, API key, base URL, retry policy, and the shared
/// [`Pacer`]. Use [`YouTubeClient::new`] for production or
/// [`YouTubeClient::with_base_url`] to point at a mock server in tests.
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
    retry: RetryPolicy,
    pacer: Pacer,
}

impl YouTubeClient {
    /// Creates a new client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
        inter_request_delay_ms: u64,
    ) -> Result<Self, YouTubeError> {
        Self::with_base_url(
            api_key,
            timeout_secs,
            user_agent,
            retry,
            inter_request_delay_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a new client with a custom base URL (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`YouTubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`YouTubeError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
        inter_request_delay_ms: u64,
        base_url: &str,
    ) -> Result<Self, YouTubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: exactly one trailing slash so path segments append to
        // the API root rather than replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| YouTubeError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            retry,
            pacer: Pacer::new(Duration::from_millis(inter_request_delay_ms)),
        })
    }

    /// Resolves a channel handle to its stable channel id via a
    /// channel-restricted search.
    ///
    /// A leading `@` on the handle is stripped before searching. An empty
    /// result set resolves to `Ok(None)` — callers skip the brand rather
    /// than treating it as a failure.
    ///
    /// # Errors
    ///
    /// - [`YouTubeError::RateLimited`] / [`YouTubeError::ServerError`] after
    ///   all retries are exhausted.
    /// - [`YouTubeError::QuotaExceeded`] / [`YouTubeError::ApiError`] on
    ///   permanent API rejections.
    /// - [`YouTubeError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn resolve_channel(&self, handle: &str) -> Result<Option<String>, YouTubeError> {
        let term = handle.trim_start_matches('@');
        let url = self.build_url(
            "search",
            &[
                ("part", "snippet"),
                ("q", term),
                ("type", "channel"),
                ("maxResults", "1"),
            ],
        );
        let body: SearchListResponse = self.get_json(&url, &format!("search(q={term})")).await?;
        Ok(body
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet.channel_id))
    }

    /// Fetches the statistics + descriptive snippet snapshot for a channel.
    ///
    /// Returns `Ok(None)` when the id yields no item. Counters the API
    /// omits (hidden stats) come back as 0, never as an absent value.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`YouTubeClient::resolve_channel`].
    pub async fn channel_stats(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelStats>, YouTubeError> {
        let url = self.build_url(
            "channels",
            &[("part", "statistics,snippet"), ("id", channel_id)],
        );
        let body: ChannelListResponse = self
            .get_json(&url, &format!("channels(id={channel_id})"))
            .await?;
        Ok(body.items.into_iter().next().map(|item| ChannelStats {
            channel_id: item.id,
            channel_name: item.snippet.title,
            subscriber_count: item.statistics.subscriber_count,
            total_view_count: item.statistics.view_count,
            total_video_count: item.statistics.video_count,
            description: item.snippet.description,
            channel_published_at: item.snippet.published_at,
        }))
    }

    /// Lists a channel's videos published at or after `published_after`,
    /// newest first, following `nextPageToken` until `max_results` items
    /// are collected or the pages run out.
    ///
    /// An empty result is a valid outcome (no recent uploads).
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`YouTubeClient::resolve_channel`].
    pub async fn recent_videos(
        &self,
        channel_id: &str,
        max_results: usize,
        published_after: DateTime<Utc>,
    ) -> Result<Vec<VideoSummary>, YouTubeError> {
        let after = published_after.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut videos: Vec<VideoSummary> = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page_size = (max_results - videos.len()).clamp(1, MAX_PAGE_SIZE).to_string();
            let mut params = vec![
                ("part", "snippet"),
                ("channelId", channel_id),
                ("type", "video"),
                ("order", "date"),
                ("maxResults", page_size.as_str()),
                ("publishedAfter", after.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = self.build_url("search", &params);
            let body: SearchListResponse = self
                .get_json(&url, &format!("search(channelId={channel_id})"))
                .await?;

            for item in body.items {
                let (Some(video_id), Some(published_at)) =
                    (item.id.video_id, item.snippet.published_at)
                else {
                    continue;
                };
                videos.push(VideoSummary {
                    video_id,
                    title: item.snippet.title,
                    published_at,
                    description: item.snippet.description,
                });
                if videos.len() >= max_results {
                    return Ok(videos);
                }
            }

            match body.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(videos)
    }

    /// Fetches per-video statistics for an id sequence of arbitrary length.
    ///
    /// The endpoint accepts at most 50 ids per call, so the input is chunked
    /// internally and the per-chunk results are concatenated in input order.
    /// Ids the API reports nothing for (deleted/private videos) are simply
    /// absent from the result.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`YouTubeClient::resolve_channel`].
    pub async fn video_stats(&self, video_ids: &[String]) -> Result<Vec<VideoDetail>, YouTubeError> {
        let mut details = Vec::with_capacity(video_ids.len());
        for chunk in video_ids.chunks(MAX_IDS_PER_CALL) {
            let ids = chunk.join(",");
            let url = self.build_url(
                "videos",
                &[("part", "statistics,snippet,contentDetails"), ("id", &ids)],
            );
            let body: VideoListResponse = self
                .get_json(&url, &format!("videos({} ids)", chunk.len()))
                .await?;
            for item in body.items {
                let Some(published_at) = item.snippet.published_at else {
                    continue;
                };
                details.push(VideoDetail {
                    video_id: item.id,
                    title: item.snippet.title,
                    published_at,
                    view_count: item.statistics.view_count,
                    like_count: item.statistics.like_count,
                    comment_count: item.statistics.comment_count,
                    duration: item.content_details.duration,
                    tags: item.snippet.tags,
                    category_id: item.snippet.category_id,
                });
            }
        }
        Ok(details)
    }

    /// Builds the full request URL with the API key and percent-encoded
    /// query parameters.
    fn build_url(&self, resource: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET through the pacer and retry policy, then parses the body.
    ///
    /// Non-2xx statuses are classified into the error taxonomy before the
    /// retry decision, so rate limiting and 5xx are retried while permanent
    /// rejections propagate immediately.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, YouTubeError> {
        let body = retry_api_call(self.retry, || {
            let url = url.clone();
            async move {
                self.pacer.acquire().await;
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                let text = response.text().await?;
                if !status.is_success() {
                    return Err(classify_error(status, &url, &text));
                }
                Ok(text)
            }
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| YouTubeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Maps a non-2xx response to the error taxonomy using the status code and
/// the `{"error": ...}` envelope's reason list.
fn classify_error(status: StatusCode, url: &Url, body: &str) -> YouTubeError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed.as_ref().map_or_else(
        || {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_owned()
        },
        |e| e.error.message.clone(),
    );
    let reasons: Vec<&str> = parsed
        .as_ref()
        .map(|e| e.error.errors.iter().map(|d| d.reason.as_str()).collect())
        .unwrap_or_default();

    let has_reason = |r: &str| reasons.iter().any(|reason| *reason == r);

    if status == StatusCode::TOO_MANY_REQUESTS
        || has_reason("rateLimitExceeded")
        || has_reason("userRateLimitExceeded")
    {
        return YouTubeError::RateLimited {
            url: display_url(url),
        };
    }
    if has_reason("quotaExceeded") || has_reason("dailyLimitExceeded") {
        return YouTubeError::QuotaExceeded { message };
    }
    if status.is_server_error() {
        return YouTubeError::ServerError {
            status: status.as_u16(),
            url: display_url(url),
        };
    }
    YouTubeError::ApiError {
        status: status.as_u16(),
        message,
    }
}

/// Renders a request URL with the `key` parameter removed, for error
/// payloads and logs.
fn display_url(url: &Url) -> String {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut clean = url.clone();
    {
        let mut pairs = clean.query_pairs_mut();
        pairs.clear();
        for (k, v) in &retained {
            pairs.append_pair(k, v);
        }
    }
    clean.to_string()
}

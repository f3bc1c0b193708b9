use thiserror::Error;

/// Errors returned by the `YouTube` Data API client.
#[derive(Debug, Error)]
pub enum YouTubeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429, or 403 carrying a rate-limit reason. Retried with back-off.
    #[error("rate limited by the YouTube API: {url}")]
    RateLimited { url: String },

    /// HTTP 5xx. Retried with back-off.
    #[error("server error {status} from {url}")]
    ServerError { status: u16, url: String },

    /// Daily/global quota exhausted. Not retried — the quota window has to
    /// reset before any call can succeed.
    #[error("YouTube API quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Any other API-level rejection (invalid key, malformed request, ...).
    /// Not retried.
    #[error("YouTube API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A custom base URL could not be parsed at client construction.
    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

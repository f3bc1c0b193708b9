use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub youtube_api_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    pub youtube_max_attempts: u32,
    pub youtube_backoff_base_ms: u64,
    pub youtube_backoff_max_ms: u64,
    pub youtube_inter_request_delay_ms: u64,
    pub crawl_max_concurrent_brands: usize,
    pub crawl_window_days: i64,
    pub crawl_max_videos: usize,
    pub stats_cache_ttl_secs: u64,
}

impl AppConfig {
    /// Returns the database URL, or a typed error when `DATABASE_URL` was not
    /// set. Commands that never touch the database skip this check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when the variable is unset.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }

    /// Returns the YouTube Data API key, or a typed error when
    /// `YOUTUBE_API_KEY` was not set. Checked before any brand is processed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when the variable is unset.
    pub fn require_youtube_api_key(&self) -> Result<&str, ConfigError> {
        self.youtube_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("YOUTUBE_API_KEY".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("youtube_max_attempts", &self.youtube_max_attempts)
            .field("youtube_backoff_base_ms", &self.youtube_backoff_base_ms)
            .field("youtube_backoff_max_ms", &self.youtube_backoff_max_ms)
            .field(
                "youtube_inter_request_delay_ms",
                &self.youtube_inter_request_delay_ms,
            )
            .field(
                "crawl_max_concurrent_brands",
                &self.crawl_max_concurrent_brands,
            )
            .field("crawl_window_days", &self.crawl_window_days)
            .field("crawl_max_videos", &self.crawl_max_videos)
            .field("stats_cache_ttl_secs", &self.stats_cache_ttl_secs)
            .finish()
    }
}

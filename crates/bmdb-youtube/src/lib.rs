//! Client for the `YouTube` Data API v3.
//!
//! Wraps `reqwest` with typed response structs, an error taxonomy that
//! separates transient faults (retried with exponential back-off) from
//! permanent ones, a shared pacer bounding the global request rate, and
//! not-found surfaced as a typed absence rather than an error.

mod client;
mod error;
mod pacer;
mod retry;
mod types;

pub use client::YouTubeClient;
pub use error::YouTubeError;
pub use pacer::Pacer;
pub use retry::RetryPolicy;
pub use types::{ChannelStats, VideoDetail, VideoSummary};

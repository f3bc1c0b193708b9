//! Per-brand crawl pipeline.
//!
//! Each brand moves through resolve → channel stats → recent videos →
//! batched video stats → row assembly. Empty or not-found results at the
//! first three stages end the brand as [`BrandOutcome::Skipped`]; an
//! unrecovered client error at any stage ends it as
//! [`BrandOutcome::Failed`]. Neither touches the other brands.

use bmdb_core::{BrandConfig, IngestRecord};
use bmdb_youtube::{ChannelStats, VideoDetail, YouTubeClient, YouTubeError};

use super::CrawlOptions;

/// Where in the pipeline a brand stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CrawlStage {
    Resolving,
    FetchingChannel,
    ListingVideos,
    FetchingDetails,
}

impl std::fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrawlStage::Resolving => write!(f, "resolving channel"),
            CrawlStage::FetchingChannel => write!(f, "fetching channel stats"),
            CrawlStage::ListingVideos => write!(f, "listing recent videos"),
            CrawlStage::FetchingDetails => write!(f, "fetching video stats"),
        }
    }
}

/// Terminal state of one brand's pipeline.
pub(crate) enum BrandOutcome {
    /// Completed the full pipeline; rows assembled in listing order.
    Done(Vec<IngestRecord>),
    /// Nothing to ingest: an empty or not-found result at `stage`.
    Skipped { stage: CrawlStage, reason: String },
    /// Unrecovered error at `stage`; the run continues with other brands.
    Failed {
        stage: CrawlStage,
        error: YouTubeError,
    },
}

/// Runs the full pipeline for one brand.
pub(crate) async fn crawl_brand(
    client: &YouTubeClient,
    brand: &BrandConfig,
    options: &CrawlOptions,
) -> BrandOutcome {
    tracing::info!(brand = %brand.name, handle = %brand.channel_handle, "crawling brand");

    let channel_id = match client.resolve_channel(&brand.channel_handle).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return skip(
                brand,
                CrawlStage::Resolving,
                format!("no channel matches handle '{}'", brand.channel_handle),
            );
        }
        Err(error) => return fail(brand, CrawlStage::Resolving, error),
    };

    let channel = match client.channel_stats(&channel_id).await {
        Ok(Some(stats)) => stats,
        Ok(None) => {
            return skip(
                brand,
                CrawlStage::FetchingChannel,
                format!("channel {channel_id} returned no stats item"),
            );
        }
        Err(error) => return fail(brand, CrawlStage::FetchingChannel, error),
    };
    tracing::info!(
        brand = %brand.name,
        channel = %channel.channel_name,
        subscribers = channel.subscriber_count,
        total_videos = channel.total_video_count,
        "resolved channel"
    );

    let summaries = match client
        .recent_videos(&channel_id, options.max_videos, options.published_after)
        .await
    {
        Ok(videos) if videos.is_empty() => {
            return skip(
                brand,
                CrawlStage::ListingVideos,
                "no uploads inside the crawl window".to_string(),
            );
        }
        Ok(videos) => videos,
        Err(error) => return fail(brand, CrawlStage::ListingVideos, error),
    };

    let video_ids: Vec<String> = summaries.iter().map(|v| v.video_id.clone()).collect();
    let details = match client.video_stats(&video_ids).await {
        Ok(details) => details,
        Err(error) => return fail(brand, CrawlStage::FetchingDetails, error),
    };

    let records = assemble_records(&brand.name, &channel, &details);
    tracing::info!(brand = %brand.name, videos = records.len(), "assembled engagement rows");
    BrandOutcome::Done(records)
}

fn skip(brand: &BrandConfig, stage: CrawlStage, reason: String) -> BrandOutcome {
    tracing::warn!(brand = %brand.name, %stage, %reason, "skipping brand");
    BrandOutcome::Skipped { stage, reason }
}

fn fail(brand: &BrandConfig, stage: CrawlStage, error: YouTubeError) -> BrandOutcome {
    tracing::error!(brand = %brand.name, %stage, error = %error, "brand pipeline failed");
    BrandOutcome::Failed { stage, error }
}

/// Joins the channel snapshot onto every fetched video detail, in fetch
/// order. Pure: re-running over the same inputs yields identical rows.
pub(crate) fn assemble_records(
    brand: &str,
    channel: &ChannelStats,
    details: &[VideoDetail],
) -> Vec<IngestRecord> {
    details
        .iter()
        .map(|video| assemble_record(brand, channel, video))
        .collect()
}

fn assemble_record(brand: &str, channel: &ChannelStats, video: &VideoDetail) -> IngestRecord {
    let (published_date, published_time) = IngestRecord::split_published_at(video.published_at);
    IngestRecord {
        brand: brand.to_owned(),
        channel_id: channel.channel_id.clone(),
        channel_name: channel.channel_name.clone(),
        channel_subscribers: clamp_i64(channel.subscriber_count),
        video_id: video.video_id.clone(),
        video_title: video.title.clone(),
        published_at: video.published_at,
        view_count: clamp_i64(video.view_count),
        like_count: clamp_i64(video.like_count),
        comment_count: clamp_i64(video.comment_count),
        engagement_rate: bmdb_core::engagement_rate(
            video.view_count,
            video.like_count,
            video.comment_count,
        ),
        duration: video.duration.clone(),
        tags: video.tags.join(","),
        category_id: video.category_id.clone(),
        published_date,
        published_time,
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

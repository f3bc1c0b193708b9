//! The crawl command.
//!
//! Drives the per-brand pipeline (resolve → channel stats → recent videos →
//! batched video stats → row assembly) across all configured brands and
//! hands the assembled rows to the sinks. Per-brand failures are logged and
//! skipped rather than propagated so a single bad brand does not abort the
//! full run.

mod brand;
pub(crate) mod export;

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};

use bmdb_core::{AppConfig, BrandConfig, IngestRecord};
use bmdb_youtube::{RetryPolicy, YouTubeClient};

pub(crate) use brand::BrandOutcome;

/// Flags for a single `crawl` invocation.
#[derive(Debug)]
pub(crate) struct CrawlArgs {
    pub brand_filter: Option<String>,
    pub dry_run: bool,
    pub csv_path: Option<PathBuf>,
    pub no_db: bool,
}

/// Run-wide knobs shared by every brand pipeline.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CrawlOptions {
    pub max_videos: usize,
    pub published_after: DateTime<Utc>,
    pub max_concurrent_brands: usize,
}

/// The full run result: assembled rows plus the per-brand outcomes, both in
/// brand-configuration order.
pub(crate) struct CrawlSummary {
    pub records: Vec<IngestRecord>,
    pub outcomes: Vec<(String, BrandOutcome)>,
}

impl CrawlSummary {
    fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, BrandOutcome::Failed { .. }))
            .count()
    }
}

/// Handler for `bmdb-cli crawl`.
///
/// # Errors
///
/// Returns an error if the API key is missing, the brands file is invalid,
/// the brand filter matches nothing, every brand fails, or a sink cannot be
/// written. Per-brand fetch failures are logged and skipped, not propagated.
pub(crate) async fn run_crawl(config: &AppConfig, args: CrawlArgs) -> anyhow::Result<()> {
    let brands_file = bmdb_core::load_brands(&config.brands_path)?;
    let brands = select_brands(brands_file.brands, args.brand_filter.as_deref())?;
    if brands.is_empty() {
        println!("no brands configured; nothing to crawl");
        return Ok(());
    }

    let client = build_youtube_client(config)?;
    let options = CrawlOptions {
        max_videos: config.crawl_max_videos,
        published_after: Utc::now() - Duration::days(config.crawl_window_days),
        max_concurrent_brands: config.crawl_max_concurrent_brands,
    };

    let summary = crawl_brands(&client, &brands, options).await;

    for (name, outcome) in &summary.outcomes {
        match outcome {
            BrandOutcome::Done(records) => println!("{name}: {} videos", records.len()),
            BrandOutcome::Skipped { stage, reason } => {
                println!("{name}: skipped while {stage} ({reason})");
            }
            BrandOutcome::Failed { stage, error } => {
                println!("{name}: failed while {stage} ({error})");
            }
        }
    }

    let failed = summary.failed_count();
    if failed > 0 {
        tracing::warn!(
            failed_brands = failed,
            total_brands = brands.len(),
            "some brands failed during the crawl"
        );
    }
    if failed == brands.len() {
        anyhow::bail!("all {failed} brands failed the crawl");
    }

    if args.dry_run {
        println!(
            "dry-run: would write {} rows from {} brands",
            summary.records.len(),
            brands.len()
        );
        return Ok(());
    }

    if let Some(path) = &args.csv_path {
        export::write_csv(path, &summary.records)?;
        println!("wrote {} rows to {}", summary.records.len(), path.display());
    }

    if !args.no_db {
        let pool = crate::connect_pool(config).await?;
        bmdb_db::run_migrations(&pool).await?;
        for record in &summary.records {
            bmdb_db::upsert_video(&pool, record).await?;
        }
        println!(
            "upserted {} rows across {} brands",
            summary.records.len(),
            brands.len()
        );
    }

    Ok(())
}

/// Crawls every brand through a buffered stream and collects rows and
/// outcomes in brand-configuration order.
///
/// `buffered` (not `buffer_unordered`) keeps completion order equal to input
/// order, so raising the concurrency limit never changes the output layout.
pub(crate) async fn crawl_brands(
    client: &YouTubeClient,
    brands: &[BrandConfig],
    options: CrawlOptions,
) -> CrawlSummary {
    let max_concurrent = options.max_concurrent_brands.max(1);

    let results: Vec<(String, BrandOutcome)> = stream::iter(brands)
        .map(|b| async move { (b.name.clone(), brand::crawl_brand(client, b, &options).await) })
        .buffered(max_concurrent)
        .collect()
        .await;

    let mut records = Vec::new();
    let mut outcomes = Vec::with_capacity(results.len());
    for (name, outcome) in results {
        if let BrandOutcome::Done(brand_records) = &outcome {
            records.extend(brand_records.iter().cloned());
        }
        outcomes.push((name, outcome));
    }

    CrawlSummary { records, outcomes }
}

/// Narrows the configured brand list to the `--brand` filter, if any.
fn select_brands(
    all: Vec<BrandConfig>,
    filter: Option<&str>,
) -> anyhow::Result<Vec<BrandConfig>> {
    match filter {
        Some(name) => {
            let selected: Vec<BrandConfig> = all
                .into_iter()
                .filter(|b| b.name.eq_ignore_ascii_case(name))
                .collect();
            if selected.is_empty() {
                anyhow::bail!("brand '{name}' is not configured; check the brands file");
            }
            Ok(selected)
        }
        None => Ok(all),
    }
}

/// Builds the API client from configuration. Fails before any brand is
/// touched when no API key is configured.
fn build_youtube_client(config: &AppConfig) -> anyhow::Result<YouTubeClient> {
    let api_key = config.require_youtube_api_key()?;
    let retry = RetryPolicy {
        max_attempts: config.youtube_max_attempts,
        base_delay_ms: config.youtube_backoff_base_ms,
        max_delay_ms: config.youtube_backoff_max_ms,
    };
    Ok(YouTubeClient::new(
        api_key,
        config.http_timeout_secs,
        &config.http_user_agent,
        retry,
        config.youtube_inter_request_delay_ms,
    )?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "crawl_test.rs"]
mod tests;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod crawl;
mod load;

#[derive(Debug, Parser)]
#[command(name = "bmdb-cli")]
#[command(about = "Brand video engagement pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the configured brand channels and persist engagement rows
    Crawl {
        /// Restrict the crawl to a single configured brand (by name)
        #[arg(long)]
        brand: Option<String>,

        /// Resolve and fetch, but do not write to any sink
        #[arg(long)]
        dry_run: bool,

        /// Also write the crawled rows to a CSV file (UTF-8 with BOM)
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Skip the database sink (useful with --csv)
        #[arg(long)]
        no_db: bool,
    },
    /// Bulk-load a previously exported CSV into the videos table,
    /// replacing its contents
    Load {
        #[arg(long, value_name = "FILE")]
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = bmdb_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            brand,
            dry_run,
            csv,
            no_db,
        } => {
            crawl::run_crawl(
                &config,
                crawl::CrawlArgs {
                    brand_filter: brand,
                    dry_run,
                    csv_path: csv,
                    no_db,
                },
            )
            .await
        }
        Commands::Load { csv } => load::run_load(&config, &csv).await,
    }
}

/// Connect to the database configured through `DATABASE_URL`.
pub(crate) async fn connect_pool(config: &bmdb_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let database_url = config.require_database_url()?;
    let pool_config = bmdb_db::PoolConfig::from_app_config(config);
    Ok(bmdb_db::connect_pool(database_url, pool_config).await?)
}

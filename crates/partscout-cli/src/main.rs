use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

use partscout_client::{BrowserPool, JsonDirSink, SiteSelectors};
use partscout_core::orchestrator::{CrawlConfig, Orchestrator, TracingReporter};
use partscout_core::{Category, MappingTable, SerializerRegistry};

#[derive(Parser)]
#[command(name = "partscout", version, about = "Hardware catalog site crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl catalog categories and write one JSON file per category
    Crawl {
        /// Categories to crawl (by slug, e.g. "cpu" "memory"); all when omitted
        categories: Vec<String>,

        /// Catalog site root URL
        #[arg(short, long, env = "PARTSCOUT_BASE_URL")]
        base_url: String,

        /// Number of concurrent browsing sessions
        #[arg(short, long, default_value_t = 5)]
        pool_size: usize,

        /// Hard per-category time budget, in seconds
        #[arg(short, long, default_value_t = 300)]
        timeout_secs: u64,

        /// Output directory for per-category JSON files
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
    },

    /// List the known categories and their variants
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("partscout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            categories,
            base_url,
            pool_size,
            timeout_secs,
            out,
        } => {
            let base_url = Url::parse(&base_url)
                .with_context(|| format!("invalid base URL: {base_url}"))?;
            let categories = parse_categories(&categories)?;
            cmd_crawl(base_url, &categories, pool_size, timeout_secs, out).await?;
        }
        Commands::Categories => cmd_categories(),
    }

    Ok(())
}

/// Resolve category slugs; no arguments means the full catalog.
fn parse_categories(slugs: &[String]) -> Result<Vec<Category>> {
    if slugs.is_empty() {
        return Ok(Category::ALL.to_vec());
    }
    slugs
        .iter()
        .map(|s| Category::from_str(s).map_err(|e| anyhow::anyhow!(e)))
        .collect()
}

async fn cmd_crawl(
    base_url: Url,
    categories: &[Category],
    pool_size: usize,
    timeout_secs: u64,
    out: PathBuf,
) -> Result<()> {
    anyhow::ensure!(pool_size > 0, "--pool-size must be at least 1");

    // A mapping that references an unregistered custom serializer is a build
    // defect; refuse to start rather than fail mid-crawl.
    let mapping = MappingTable::builtin();
    let registry = SerializerRegistry::builtin();
    mapping
        .validate(&registry)
        .context("built-in mapping table failed validation")?;

    tracing::info!(%base_url, categories = categories.len(), pool_size, "launching browser");

    let pool = BrowserPool::with_options(Duration::from_secs(30), SiteSelectors::default())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    let sessions = pool.sessions(pool_size).await.map_err(|e| anyhow::anyhow!(e))?;

    let orchestrator = Orchestrator::new(
        Arc::new(mapping),
        Arc::new(registry),
        JsonDirSink::new(&out),
        CrawlConfig::new(base_url).with_timeout(Duration::from_secs(timeout_secs)),
    );

    // Ctrl-C stops dispatching new categories; in-flight ones finish and
    // their results are still written.
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; finishing in-flight categories");
            cancel_on_signal.cancel();
        }
    });

    let reports = orchestrator
        .run(sessions, categories, cancel, Arc::new(TracingReporter))
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    let failed = reports.iter().filter(|r| !r.is_complete()).count();
    println!("Crawled {} categories ({} failed):", reports.len(), failed);
    for report in &reports {
        match &report.error {
            None => println!("  [ok]      {:<16} {} records", report.category, report.records),
            Some(e) => println!(
                "  [partial] {:<16} {} records — {}",
                report.category, report.records, e
            ),
        }
    }
    println!("Output written to {}", out.display());

    Ok(())
}

fn cmd_categories() {
    for &category in Category::ALL {
        let variants = category.variants();
        if variants.len() == 1 {
            println!("{}", category.slug());
        } else {
            let names: Vec<&str> = variants.iter().map(|v| v.name).collect();
            println!("{} ({})", category.slug(), names.join(", "));
        }
    }
}

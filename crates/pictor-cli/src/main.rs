use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pictor_client::{HtmlImageExtractor, ReqwestFetcher};
use pictor_core::engine::{Engine, EngineConfig, TracingReporter};
use pictor_core::item::CatalogRecord;
use pictor_core::politeness::{PoliteFetcher, PolitenessConfig};
use pictor_core::report::RunReport;
use pictor_core::state::RunState;
use pictor_core::traits::{ArchiveLookup, CatalogProvider, NullArchive, StateStore};
use pictor_store::{CsvCatalog, DirArchive, JsonStateStore};

#[derive(Parser)]
#[command(name = "pictor", version, about = "Catalog image backfill engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search external sources for missing product images
    Run {
        /// Catalog CSV to backfill
        #[arg(short, long)]
        catalog: PathBuf,

        /// Path of the durable state file
        #[arg(short, long, env = "PICTOR_STATE", default_value = "pictor-state.json")]
        state: PathBuf,

        /// Local image archive directory, checked before any network source
        #[arg(short, long, env = "PICTOR_ARCHIVE")]
        archive: Option<PathBuf>,

        /// Continue from the existing state file instead of starting fresh
        #[arg(long, default_value_t = false)]
        resume: bool,

        /// Cap the number of items processed this invocation
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only process items from this vendor (case-insensitive)
        #[arg(long)]
        vendor: Option<String>,

        /// Only process the item with this catalog handle
        #[arg(long)]
        handle: Option<String>,

        /// Search and transition in memory, but never write the state file
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Mark an item skipped before processing (repeatable)
        #[arg(long = "skip")]
        skips: Vec<String>,

        /// Attempts per item before failure becomes terminal
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,

        /// Politeness delay between requests to the same host, in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,

        /// Per-request timeout, in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },

    /// Print the run report from an existing state file
    Report {
        /// Path of the durable state file
        #[arg(short, long, env = "PICTOR_STATE", default_value = "pictor-state.json")]
        state: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pictor=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            catalog,
            state,
            archive,
            resume,
            limit,
            vendor,
            handle,
            dry_run,
            skips,
            max_attempts,
            delay_ms,
            timeout_secs,
        } => {
            let records = CsvCatalog::new(&catalog)
                .load()
                .map_err(|e| anyhow::anyhow!(e))
                .with_context(|| format!("Failed to load catalog {}", catalog.display()))?;
            let records = filter_catalog(records, vendor.as_deref(), handle.as_deref());

            let store = JsonStateStore::new(&state);
            let initial = if resume {
                store.load().map_err(|e| anyhow::anyhow!(e))?
            } else {
                RunState::new()
            };

            let config = EngineConfig::default()
                .with_max_attempts(max_attempts)
                .with_limit(limit)
                .with_dry_run(dry_run)
                .with_skips(skips);

            let fetcher = PoliteFetcher::new(
                ReqwestFetcher::with_timeout(Duration::from_secs(timeout_secs))
                    .map_err(|e| anyhow::anyhow!(e))?,
                PolitenessConfig::new(Duration::from_millis(delay_ms)),
            );

            // The interrupt handler only cancels the token it captured; the
            // engine observes it between items.
            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::warn!("Interrupt received; finishing the current item");
                        cancel.cancel();
                    }
                });
            }

            match archive {
                Some(dir) => {
                    cmd_run(
                        fetcher,
                        DirArchive::new(dir),
                        store,
                        config,
                        initial,
                        records,
                        cancel,
                        dry_run,
                    )
                    .await?;
                }
                None => {
                    cmd_run(
                        fetcher, NullArchive, store, config, initial, records, cancel, dry_run,
                    )
                    .await?;
                }
            }
        }
        Commands::Report { state } => {
            cmd_report(&state)?;
        }
    }

    Ok(())
}

/// Apply `--vendor` / `--handle` filters to the loaded catalog.
fn filter_catalog(
    records: Vec<CatalogRecord>,
    vendor: Option<&str>,
    handle: Option<&str>,
) -> Vec<CatalogRecord> {
    records
        .into_iter()
        .filter(|r| {
            vendor.is_none_or(|v| r.vendor.eq_ignore_ascii_case(v))
                && handle.is_none_or(|h| r.key == h)
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
async fn cmd_run<F, A>(
    fetcher: F,
    archive: A,
    store: JsonStateStore,
    config: EngineConfig,
    initial: RunState,
    records: Vec<CatalogRecord>,
    cancel: CancellationToken,
    dry_run: bool,
) -> Result<()>
where
    F: pictor_core::traits::Fetcher,
    A: ArchiveLookup,
{
    let state_path = store.path().to_path_buf();
    let engine = Engine::new(fetcher, HtmlImageExtractor::new(), archive, store, config);

    let (state, summary) = engine
        .run(initial, records, cancel, &TracingReporter)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Run aborted")?;

    println!("{}", RunReport::from_state(&state).render());
    if summary.interrupted {
        println!("interrupted after {} item(s)", summary.processed);
    }
    if dry_run {
        println!("dry run: state file not written");
    } else {
        println!("state: {}", state_path.display());
    }

    Ok(())
}

fn cmd_report(state_path: &PathBuf) -> Result<()> {
    let store = JsonStateStore::new(state_path);
    let state = store.load().map_err(|e| anyhow::anyhow!(e))?;
    if state.items.is_empty() {
        println!("No run state at {}", state_path.display());
        return Ok(());
    }
    println!("{}", RunReport::from_state(&state).render());
    println!("state: {}", state_path.display());
    Ok(())
}

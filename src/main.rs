use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use anistrm::{
    JsonFileStore, NoopReporter, ProgressEvent, ProgressReporter, ReqwestClient,
    SharedProgressReporter, StateStore, SyncConfig, SyncOptions, SyncState, dispatch,
    fetch_latest,
};

// Emoji with fallback for terminals without Unicode support
static TV: Emoji<'_, '_> = Emoji("📺 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Mirror a seasonal anime directory listing as .strm files
#[derive(Parser, Debug)]
#[command(name = "anistrm")]
#[command(about = "Mirror a seasonal anime directory listing as .strm files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one incremental sync against the state document
    Sync {
        /// Path of the JSON state document (settings and processed set)
        state: PathBuf,

        /// Run even if the state document has the sync disabled
        #[arg(short, long)]
        force: bool,

        /// Override the directory-listing base URL
        #[arg(long)]
        listing_base: Option<String>,

        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the latest releases with normalized links
    Latest {
        /// Override the latest-releases feed URL
        #[arg(long)]
        feed: Option<String>,
    },

    /// Write a fresh state document
    Init {
        /// Path of the JSON state document to create
        state: PathBuf,

        /// Root directory for the .strm tree
        #[arg(short, long)]
        storage: PathBuf,

        /// First year to sweep
        #[arg(long)]
        start_year: Option<i32>,

        /// First season month to sweep (1, 4, 7 or 10)
        #[arg(long)]
        start_season: Option<u32>,

        /// Enable scheduled syncs right away
        #[arg(long)]
        enable: bool,
    },
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    bar: ProgressBar,
    created: AtomicUsize,
}

impl IndicatifReporter {
    fn new() -> Result<Self> {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░");

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Ok(Self {
            bar,
            created: AtomicUsize::new(0),
        })
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::PeriodsPlanned { periods } => {
                self.bar.set_length(periods.len() as u64);
                self.bar.set_position(0);
            }

            ProgressEvent::FetchingPeriod { period, .. } => {
                self.bar.set_message(format!(
                    "{SEARCH}Listing {}",
                    period.to_string().cyan()
                ));
            }

            ProgressEvent::PeriodListed { period, entries } => {
                self.bar.inc(1);
                self.bar.set_message(format!(
                    "{} • {} files",
                    period.to_string().cyan(),
                    entries.to_string().yellow()
                ));
            }

            ProgressEvent::DescriptorCreated { .. } => {
                let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
                self.bar.set_message(format!(
                    "{SUCCESS}{} new .strm files",
                    created.to_string().green()
                ));
            }

            ProgressEvent::DescriptorFailed { file_name, error } => {
                self.bar.println(format!(
                    "  {CROSS}{} - {}",
                    file_name.yellow(),
                    error.dimmed()
                ));
            }

            ProgressEvent::SyncCompleted {
                created_count,
                backfilled_count,
                known_count,
                failed_count,
                ledger_size,
            } => {
                self.bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} created, {} already on disk, {} known, {} failed ({} records)",
                    "Sync complete:".bold().green(),
                    created_count.to_string().green().bold(),
                    backfilled_count.to_string().yellow(),
                    known_count.to_string().yellow(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    },
                    ledger_size.to_string().cyan()
                );
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}

async fn run_sync_command(
    state: PathBuf,
    force: bool,
    listing_base: Option<String>,
    quiet: bool,
) -> Result<()> {
    let store = JsonFileStore::new(&state);
    let client = ReqwestClient::new();

    let mut options = SyncOptions::default();
    if let Some(base) = listing_base {
        options.listing_base = base;
    }
    options.validate().context("Invalid endpoint")?;

    let reporter: SharedProgressReporter = if quiet {
        NoopReporter::shared()
    } else {
        println!(
            "\n{}{} {}\n",
            TV,
            "anistrm".bold().magenta(),
            "- .strm library sync".dimmed()
        );
        Arc::new(IndicatifReporter::new()?)
    };

    let today = Local::now().date_naive();
    let report = dispatch(&client, &store, &options, today, force, &reporter)
        .await
        .with_context(|| format!("Failed to sync {}", state.display()))?;

    let Some(report) = report else {
        if !quiet {
            println!("Sync is disabled in {}; pass --force to run anyway", state.display());
        }
        return Ok(());
    };

    if !quiet
        && let Ok(loaded) = store.load()
        && let Some(root) = loaded.config.storage_root
    {
        println!("\n{FOLDER}Output: {}\n", root.display().to_string().cyan());
    }

    if report.failed > 0 && report.created == 0 {
        std::process::exit(1);
    }

    Ok(())
}

async fn run_latest_command(feed: Option<String>) -> Result<()> {
    let client = ReqwestClient::new();

    let mut options = SyncOptions::default();
    if let Some(feed) = feed {
        options.release_feed = feed;
    }
    options.validate().context("Invalid endpoint")?;

    let entries = fetch_latest(&client, &options).await;
    if entries.is_empty() {
        println!("{}", "No releases found".yellow());
    }

    for entry in entries {
        println!("{}", entry.name.bold());
        if let Some(url) = entry.url {
            println!("  {}", url.cyan());
        }
    }

    Ok(())
}

fn run_init_command(
    state: PathBuf,
    storage: PathBuf,
    start_year: Option<i32>,
    start_season: Option<u32>,
    enable: bool,
) -> Result<()> {
    if state.exists() {
        bail!("{} already exists", state.display());
    }

    let defaults = SyncConfig::default();
    let document = SyncState {
        config: SyncConfig {
            enabled: enable,
            storage_root: Some(storage),
            start_year: start_year.or(defaults.start_year),
            start_season: start_season.or(defaults.start_season),
            ..defaults
        },
        ledger: Default::default(),
    };

    JsonFileStore::new(&state)
        .save(&document)
        .context("Failed to write state document")?;

    println!("{SUCCESS}Wrote {}", state.display().to_string().cyan());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    match args.command {
        Command::Sync {
            state,
            force,
            listing_base,
            quiet,
        } => run_sync_command(state, force, listing_base, quiet).await,
        Command::Latest { feed } => run_latest_command(feed).await,
        Command::Init {
            state,
            storage,
            start_year,
            start_season,
            enable,
        } => run_init_command(state, storage, start_year, start_season, enable),
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use chrono::NaiveDate;
use tracing::{error, info};
use url::Url;

use crate::descriptor::{DescriptorWriter, WriteOutcome, normalize_link};
use crate::error::{ConfigError, SyncError};
use crate::http::HttpClient;
use crate::listing::{
    CatalogEntry, DEFAULT_LISTING_BASE, DEFAULT_RELEASE_FEED, fetch_period, fetch_release_feed,
};
use crate::period::{ReleasePeriod, current_period, enumerate_periods};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::retry::RetryPolicy;
use crate::state::SyncState;
use crate::store::StateStore;

/// Options for a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Base URL of the directory-listing worker
    pub listing_base: String,
    /// URL of the latest-releases RSS feed
    pub release_feed: String,
    /// Retry policy for every remote call
    pub retry: RetryPolicy,
    /// Pause between two consecutive period listings
    pub pacing: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            listing_base: DEFAULT_LISTING_BASE.to_string(),
            release_feed: DEFAULT_RELEASE_FEED.to_string(),
            retry: RetryPolicy::default(),
            pacing: Duration::from_millis(500),
        }
    }
}

impl SyncOptions {
    /// Check that both endpoints are absolute http(s) URLs
    pub fn validate(&self) -> Result<(), ConfigError> {
        for endpoint in [&self.listing_base, &self.release_feed] {
            let invalid = |reason: String| ConfigError::InvalidEndpoint {
                url: endpoint.clone(),
                reason,
            };

            let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
            }
        }
        Ok(())
    }
}

/// Result of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Number of periods swept
    pub periods: usize,
    /// Number of entries the listings returned
    pub listed: usize,
    /// Number of descriptors newly written
    pub created: usize,
    /// Number of files found on disk and recorded
    pub backfilled: usize,
    /// Number of entries skipped thanks to the ledger
    pub already_known: usize,
    /// Number of entries whose descriptor could not be written
    pub failed: usize,
    /// Ledger size after the run
    pub ledger_size: usize,
}

/// Fetch every period listing in order, pausing between requests
async fn collect_period_entries<C: HttpClient>(
    client: &C,
    periods: &[ReleasePeriod],
    options: &SyncOptions,
    reporter: &SharedProgressReporter,
) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();

    for (index, &period) in periods.iter().enumerate() {
        if index > 0 && !options.pacing.is_zero() {
            tokio::time::sleep(options.pacing).await;
        }

        reporter.report(ProgressEvent::FetchingPeriod {
            period,
            index,
            total: periods.len(),
        });

        let listed = fetch_period(client, &options.listing_base, period, &options.retry).await;
        info!(%period, files = listed.len(), "Fetched period listing");

        reporter.report(ProgressEvent::PeriodListed {
            period,
            entries: listed.len(),
        });

        entries.extend(listed);
    }

    entries
}

/// Run one full incremental sync
///
/// This is the core routine behind every trigger. It:
/// 1. Checks the storage root (before touching the network or any state)
/// 2. Enumerates the periods from the configured start to `today`
/// 3. Fetches each period listing sequentially, pacing the requests
/// 4. Writes a descriptor for every entry the ledger does not know yet
/// 5. Persists the state through `store`
///
/// Failed listings and failed writes are logged and counted, never fatal.
pub async fn run_sync<C: HttpClient, S: StateStore>(
    client: &C,
    store: &S,
    state: &mut SyncState,
    options: &SyncOptions,
    today: NaiveDate,
    reporter: &SharedProgressReporter,
) -> Result<SyncReport, SyncError> {
    let storage_root = match state.config.storage_root() {
        Ok(root) => root.to_path_buf(),
        Err(e) => {
            error!("No .strm storage root configured, sync aborted");
            return Err(e.into());
        }
    };
    options.validate()?;

    let fallback_period = current_period(today);
    let start = state.config.start_period();
    let periods = enumerate_periods(start.year, start.month, today);

    info!(
        count = periods.len(),
        from = %start,
        to = %fallback_period,
        "Fetching period listings"
    );
    reporter.report(ProgressEvent::PeriodsPlanned {
        periods: periods.clone(),
    });

    let entries = collect_period_entries(client, &periods, options, reporter).await;
    info!(entries = entries.len(), "Collected listing entries");

    let writer = DescriptorWriter::new(storage_root, fallback_period, options.listing_base.clone());
    let mut report = SyncReport {
        periods: periods.len(),
        listed: entries.len(),
        ..Default::default()
    };

    for entry in &entries {
        match writer.write_entry(entry, &mut state.ledger).await {
            WriteOutcome::Created(path) => {
                report.created += 1;
                reporter.report(ProgressEvent::DescriptorCreated { path });
            }
            WriteOutcome::AlreadyKnown => report.already_known += 1,
            WriteOutcome::Backfilled => report.backfilled += 1,
            WriteOutcome::Failed(e) => {
                report.failed += 1;
                reporter.report(ProgressEvent::DescriptorFailed {
                    file_name: entry.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report.ledger_size = state.ledger.len();

    if let Err(e) = store.save(state) {
        error!(error = %e, "Failed to persist processed set");
        return Err(e.into());
    }

    info!(
        created = report.created,
        backfilled = report.backfilled,
        failed = report.failed,
        ledger_size = report.ledger_size,
        "Created {} new .strm files, {} processed records in total",
        report.created,
        report.ledger_size
    );

    reporter.report(ProgressEvent::SyncCompleted {
        created_count: report.created,
        backfilled_count: report.backfilled,
        known_count: report.already_known,
        failed_count: report.failed,
        ledger_size: report.ledger_size,
    });

    Ok(report)
}

/// Entry point for the host scheduler
///
/// Loads the state, honours the enabled and run-once flags, and runs a sync.
/// Returns `None` when the feature is disabled. `force` runs even when disabled.
/// The run-once flag is cleared and persisted before the sync starts.
pub async fn dispatch<C: HttpClient, S: StateStore>(
    client: &C,
    store: &S,
    options: &SyncOptions,
    today: NaiveDate,
    force: bool,
    reporter: &SharedProgressReporter,
) -> Result<Option<SyncReport>, SyncError> {
    let mut state = store.load()?;

    if let Err(e) = state.config.storage_root() {
        error!("No .strm storage root configured, the sync cannot work");
        return Err(e.into());
    }

    if !state.config.enabled && !state.config.run_once && !force {
        info!("Sync is disabled, nothing to do");
        return Ok(None);
    }

    if state.config.run_once {
        info!("Run-once requested, running now");
        state.config.run_once = false;
        store.save(&state)?;
    }

    run_sync(client, store, &mut state, options, today, reporter)
        .await
        .map(Some)
}

/// Fetch the latest-releases feed and normalize every link
///
/// Inspection only: nothing is written and the ledger is not consulted.
pub async fn fetch_latest<C: HttpClient>(client: &C, options: &SyncOptions) -> Vec<CatalogEntry> {
    fetch_release_feed(client, &options.release_feed, &options.retry)
        .await
        .into_iter()
        .map(|item| {
            let url = (!item.link.is_empty()).then(|| normalize_link(&item.link));
            CatalogEntry::linked(item.title, url)
        })
        .collect()
}

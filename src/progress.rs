use std::path::PathBuf;
use std::sync::Arc;

use crate::period::ReleasePeriod;

/// Events emitted during a sync run for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The sweep is about to fetch these periods, oldest first
    PeriodsPlanned { periods: Vec<ReleasePeriod> },

    /// A period listing is being fetched
    FetchingPeriod {
        period: ReleasePeriod,
        /// Index of this period in the sweep
        index: usize,
        total: usize,
    },

    /// A period listing came back (empty if every attempt failed)
    PeriodListed { period: ReleasePeriod, entries: usize },

    /// A new descriptor file was written
    DescriptorCreated { path: PathBuf },

    /// Writing a descriptor failed; the run continues
    DescriptorFailed { file_name: String, error: String },

    /// Sync run completed
    SyncCompleted {
        created_count: usize,
        backfilled_count: usize,
        known_count: usize,
        failed_count: usize,
        ledger_size: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

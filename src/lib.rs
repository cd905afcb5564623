pub mod descriptor;
pub mod error;
pub mod http;
pub mod listing;
pub mod period;
pub mod progress;
pub mod retry;
pub mod state;
pub mod store;
pub mod sync;

// Re-export main types for convenience
pub use descriptor::{DescriptorWriter, WriteOutcome, extract_series_name, normalize_link};
pub use error::{ConfigError, DescriptorError, ListingError, StoreError, SyncError};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use listing::{CatalogEntry, fetch_period, fetch_release_feed};
pub use period::{ReleasePeriod, current_period, enumerate_periods};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use retry::RetryPolicy;
pub use state::{Ledger, ProcessedRecord, SyncConfig, SyncState};
pub use store::{JsonFileStore, StateStore};
pub use sync::{SyncOptions, SyncReport, dispatch, fetch_latest, run_sync};

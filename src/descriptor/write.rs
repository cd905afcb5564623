use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::error::DescriptorError;
use crate::listing::CatalogEntry;
use crate::period::ReleasePeriod;
use crate::state::Ledger;

use super::link::{canonicalize, is_canonical, period_file_link};
use super::name::extract_series_name;

/// Extension of the stream descriptor files
pub const DESCRIPTOR_EXTENSION: &str = "strm";

/// What happened to one entry handed to the [`DescriptorWriter`]
#[derive(Debug)]
pub enum WriteOutcome {
    /// A new descriptor was written at this path
    Created(PathBuf),
    /// The ledger already had a record; nothing was touched
    AlreadyKnown,
    /// The file already existed on disk; a record was added for it
    Backfilled,
    /// Creating the directory or writing the file failed
    Failed(DescriptorError),
}

impl WriteOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Materializes catalog entries as `.strm` files below a storage root
///
/// Layout: `{root}/{period}/{series}/{file name}.strm`, where entries without a
/// period are filed under `fallback_period`.
#[derive(Debug, Clone)]
pub struct DescriptorWriter {
    root: PathBuf,
    fallback_period: ReleasePeriod,
    listing_base: String,
}

impl DescriptorWriter {
    pub fn new(
        root: impl Into<PathBuf>,
        fallback_period: ReleasePeriod,
        listing_base: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            fallback_period,
            listing_base: listing_base.into(),
        }
    }

    /// Target path of the descriptor for `entry`, whose series is `series_name`
    pub fn descriptor_path(&self, entry: &CatalogEntry, series_name: &str) -> PathBuf {
        let period = entry.period.unwrap_or(self.fallback_period);

        self.root
            .join(period.to_string())
            .join(path_component(series_name))
            .join(format!(
                "{}.{DESCRIPTOR_EXTENSION}",
                path_component(&entry.name)
            ))
    }

    /// Playable URL written into the descriptor for `entry`
    pub fn descriptor_url(&self, entry: &CatalogEntry) -> String {
        match &entry.url {
            Some(url) if is_canonical(url) => url.clone(),
            Some(url) => canonicalize(url),
            None => period_file_link(
                &self.listing_base,
                entry.period.unwrap_or(self.fallback_period),
                &entry.name,
            ),
        }
    }

    /// Write the descriptor for `entry` unless it was handled before
    ///
    /// The ledger is consulted before any filesystem access. Existing files are
    /// never overwritten. Write failures are logged and reported as
    /// [`WriteOutcome::Failed`], never propagated.
    pub async fn write_entry(&self, entry: &CatalogEntry, ledger: &mut Ledger) -> WriteOutcome {
        if ledger.contains(&entry.name) {
            debug!(file = %entry.name, "Already in processed set, skipping");
            return WriteOutcome::AlreadyKnown;
        }

        let series_name = extract_series_name(&entry.name);
        let path = self.descriptor_path(entry, &series_name);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Descriptor already on disk, recording it");
            ledger.record(&entry.name, entry.period, &series_name);
            return WriteOutcome::Backfilled;
        }

        let url = self.descriptor_url(entry);

        match write_descriptor(&path, &url).await {
            Ok(()) => {
                debug!(path = %path.display(), "Created descriptor");
                ledger.record(&entry.name, entry.period, &series_name);
                WriteOutcome::Created(path)
            }
            Err(e) => {
                error!(file = %entry.name, error = %e, "Failed to create .strm file");
                WriteOutcome::Failed(e)
            }
        }
    }

    /// Write the descriptor for `entry`; `true` only if a new file was created
    pub async fn write(&self, entry: &CatalogEntry, ledger: &mut Ledger) -> bool {
        self.write_entry(entry, ledger).await.is_created()
    }
}

/// Make `name` usable as a single path component
///
/// Only separators, NUL and the `.`/`..` entries are neutralized; every other
/// character is kept so the tree matches the names the listing advertises.
fn path_component(name: &str) -> String {
    let component: String = name
        .chars()
        .map(|c| match c {
            '/' | '\0' => '_',
            '\\' if cfg!(windows) => '_',
            c => c,
        })
        .collect();

    match component.as_str() {
        "" | "." => "_".to_string(),
        ".." => "__".to_string(),
        _ => component,
    }
}

async fn write_descriptor(path: &Path, url: &str) -> Result<(), DescriptorError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DescriptorError::CreateDirectoryFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
    }

    tokio::fs::write(path, url)
        .await
        .map_err(|e| DescriptorError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

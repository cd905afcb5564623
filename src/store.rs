// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::state::SyncState;

/// Durable home of the [`SyncState`], loaded and saved wholesale
///
/// The store is the single writer of the persisted representation.
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<SyncState, StoreError>;

    fn save(&self, state: &SyncState) -> Result<(), StoreError>;
}

/// Stores the state as one pretty-printed JSON document
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".partial");
        PathBuf::from(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<SyncState, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| StoreError::ReadFailed {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| StoreError::JsonParseFailed {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Write to a `.partial` sibling first, then rename over the old document
    fn save(&self, state: &SyncState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        let partial = self.partial_path();

        std::fs::write(&partial, json).map_err(|e| StoreError::WriteFailed {
            path: partial.clone(),
            source: e,
        })?;

        std::fs::rename(&partial, &self.path).map_err(|e| StoreError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

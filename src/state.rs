use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::period::{DEFAULT_START_YEAR, ReleasePeriod};

/// Trigger expression written into a fresh state document
pub const DEFAULT_TRIGGER: &str = "*/20 22,23,0,1 * * *";

/// Operator-supplied settings
///
/// Serialized with the keys the operator form has always used, so existing
/// state documents keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Cron-style expression for the host scheduler; never interpreted here
    #[serde(default, rename = "cron")]
    pub trigger: Option<String>,

    /// Run once on the next dispatch, then clear the flag
    #[serde(default, rename = "onlyonce")]
    pub run_once: bool,

    /// Root directory for the generated `.strm` tree
    #[serde(default, rename = "storageplace")]
    pub storage_root: Option<PathBuf>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub start_year: Option<i32>,

    /// Season month (1, 4, 7 or 10) of the first period to sweep
    #[serde(default, deserialize_with = "lenient_number")]
    pub start_season: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger: Some(DEFAULT_TRIGGER.to_string()),
            run_once: false,
            storage_root: None,
            start_year: Some(DEFAULT_START_YEAR),
            start_season: Some(1),
        }
    }
}

impl SyncConfig {
    /// The configured storage root, rejecting a missing or blank path
    pub fn storage_root(&self) -> Result<&Path, ConfigError> {
        match &self.storage_root {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.as_path()),
            _ => Err(ConfigError::MissingStorageRoot),
        }
    }

    /// First period of the historical sweep
    ///
    /// Defaults to 2019-1. A missing or non-positive year counts as unset;
    /// an invalid season month becomes 1.
    pub fn start_period(&self) -> ReleasePeriod {
        ReleasePeriod::new(
            self.start_year
                .filter(|year| *year > 0)
                .unwrap_or(DEFAULT_START_YEAR),
            self.start_season.unwrap_or(1),
        )
    }
}

/// Operator forms store numbers as either JSON numbers or numeric strings
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    let value: Option<NumberOrText<T>> = Option::deserialize(deserializer)?;

    Ok(match value {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Ledger entry for one handled file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    /// Period key of the listing the file came from, if any
    #[serde(rename = "season")]
    pub period: Option<String>,
    #[serde(rename = "anime_name")]
    pub series_name: String,
    /// RFC 3339 timestamp of when the record was made
    pub created_at: String,
}

/// Processed-set: raw file name to [`ProcessedRecord`]
///
/// The only idempotence mechanism. A record means the descriptor was written at
/// some point, or was found on disk and back-filled, whether or not it still exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: BTreeMap<String, ProcessedRecord>,
}

impl Ledger {
    pub fn contains(&self, file_name: &str) -> bool {
        self.records.contains_key(file_name)
    }

    pub fn get(&self, file_name: &str) -> Option<&ProcessedRecord> {
        self.records.get(file_name)
    }

    /// Record `file_name` as handled, stamped with the current time
    pub fn record(&mut self, file_name: &str, period: Option<ReleasePeriod>, series_name: &str) {
        self.records.insert(
            file_name.to_string(),
            ProcessedRecord {
                period: period.map(|p| p.to_string()),
                series_name: series_name.to_string(),
                created_at: Utc::now().to_rfc3339(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything one run reads and mutates: operator settings plus the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(flatten)]
    pub config: SyncConfig,

    #[serde(default, rename = "processed_files")]
    pub ledger: Ledger,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_root_rejects_missing_and_blank() {
        let mut config = SyncConfig::default();
        assert_eq!(config.storage_root(), Err(ConfigError::MissingStorageRoot));

        config.storage_root = Some(PathBuf::new());
        assert_eq!(config.storage_root(), Err(ConfigError::MissingStorageRoot));

        config.storage_root = Some(PathBuf::from("/downloads/strm"));
        assert_eq!(config.storage_root(), Ok(Path::new("/downloads/strm")));
    }

    #[test]
    fn start_period_defaults_and_normalizes() {
        let mut config = SyncConfig {
            start_year: None,
            start_season: None,
            ..Default::default()
        };
        assert_eq!(config.start_period(), ReleasePeriod::new(2019, 1));

        config.start_year = Some(2023);
        config.start_season = Some(8);
        assert_eq!(config.start_period(), ReleasePeriod::new(2023, 1));

        config.start_season = Some(7);
        assert_eq!(config.start_period(), ReleasePeriod::new(2023, 7));
    }

    #[test]
    fn zero_start_year_means_default() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"start_year": "0", "start_season": 4}"#).unwrap();
        assert_eq!(config.start_period(), ReleasePeriod::new(2019, 4));

        let config = SyncConfig {
            start_year: Some(-5),
            ..Default::default()
        };
        assert_eq!(config.start_period().year, 2019);
    }

    #[test]
    fn deserializes_operator_document() {
        let json = r#"{
            "enabled": true,
            "onlyonce": false,
            "storageplace": "/downloads/strm",
            "cron": "*/20 22,23,0,1 * * *",
            "start_year": "2023",
            "start_season": 4,
            "processed_files": {
                "[ANi] Show - 01 [1080P]": {
                    "season": "2023-4",
                    "anime_name": "Show",
                    "created_at": "2023-04-10T22:00:00"
                },
                "[ANi] Other - 01 [1080P]": {
                    "season": null,
                    "anime_name": "Other",
                    "created_at": "2023-04-11T22:00:00"
                }
            }
        }"#;

        let state: SyncState = serde_json::from_str(json).unwrap();

        assert!(state.config.enabled);
        assert_eq!(state.config.start_year, Some(2023));
        assert_eq!(state.config.start_season, Some(4));
        assert_eq!(
            state.config.storage_root,
            Some(PathBuf::from("/downloads/strm"))
        );
        assert_eq!(state.ledger.len(), 2);

        let record = state.ledger.get("[ANi] Show - 01 [1080P]").unwrap();
        assert_eq!(record.period.as_deref(), Some("2023-4"));
        assert_eq!(record.series_name, "Show");
        assert!(state.ledger.get("[ANi] Other - 01 [1080P]").unwrap().period.is_none());
    }

    #[test]
    fn blank_or_garbage_numbers_become_none() {
        let state: SyncState =
            serde_json::from_str(r#"{"start_year": "", "start_season": "winter"}"#).unwrap();

        assert_eq!(state.config.start_year, None);
        assert_eq!(state.config.start_season, None);
        assert!(state.ledger.is_empty());
    }

    #[test]
    fn serializes_with_operator_keys() {
        let mut state = SyncState::default();
        state.config.storage_root = Some(PathBuf::from("/strm"));
        state
            .ledger
            .record("[ANi] Show - 01", Some(ReleasePeriod::new(2024, 1)), "Show");

        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["storageplace"], "/strm");
        assert_eq!(value["onlyonce"], false);
        assert_eq!(value["cron"], DEFAULT_TRIGGER);
        assert_eq!(value["processed_files"]["[ANi] Show - 01"]["season"], "2024-1");
        assert_eq!(value["processed_files"]["[ANi] Show - 01"]["anime_name"], "Show");
    }

    #[test]
    fn record_overwrites_and_counts() {
        let mut ledger = Ledger::default();
        ledger.record("a", None, "A");
        ledger.record("a", Some(ReleasePeriod::new(2024, 4)), "A");
        ledger.record("b", None, "B");

        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("a"));
        assert_eq!(ledger.get("a").unwrap().period.as_deref(), Some("2024-4"));
        assert!(!ledger.contains("c"));
    }
}

//! Local registry of in-flight activations.
//!
//! Every rented number is written to a small JSON file as soon as it is
//! acquired and removed once the activation is finished or cancelled. After a
//! crash the file tells which paid reservations are still open, and the
//! creation time decides whether the provider will accept a cancellation yet.
//!
//! The file is a flat, pretty-printed list:
//!
//! ```json
//! [
//!   {
//!     "activation_id": "123456789",
//!     "phone_number": "6281234567890",
//!     "created_at": "2025-01-01T12:00:00.123456Z"
//!   }
//! ]
//! ```
//!
//! It is read fully and rewritten fully on every mutation. There is no
//! locking; one process owns the file.

use crate::types::ActivationId;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Default registry location, relative to the working directory.
pub const DEFAULT_REGISTRY_PATH: &str = "activations.json";

/// Errors raised while persisting the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The file or its parent directory could not be written.
    #[error("Failed to write activation registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be encoded.
    #[error("Failed to serialize activation registry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One tracked activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    #[serde(deserialize_with = "deserialize_activation_id")]
    pub activation_id: ActivationId,
    pub phone_number: String,
    /// Creation time; `None` when missing or unparseable in the file.
    #[serde(default, deserialize_with = "deserialize_created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ActivationRecord {
    /// Age of the record at `now`, or `None` without a timestamp.
    ///
    /// Timestamps in the future count as zero age.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        let created_at = self.created_at?;
        Some(now.signed_duration_since(created_at).to_std().unwrap_or_default())
    }
}

/// Whether a tracked activation may be cancelled right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelGate {
    /// Old enough, or the age is unknown.
    Allowed,
    /// Younger than the provider's minimum age.
    TooEarly { age: Duration, min_age: Duration },
    /// No record for this activation.
    NotTracked,
}

impl CancelGate {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// JSON-file registry of open activations.
#[derive(Debug, Clone)]
pub struct ActivationRegistry {
    path: PathBuf,
}

impl Default for ActivationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_PATH)
    }
}

impl ActivationRegistry {
    /// Registry backed by the file at `path`; the file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record.
    ///
    /// A missing file is an empty registry. An unreadable file, a document
    /// that is not a JSON list, or individual malformed entries are logged and
    /// skipped rather than failing the caller.
    pub fn load(&self) -> Vec<ActivationRecord> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(path = %self.path.display(), error = %_e, "Failed to read activation registry");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<Vec<Value>>(&contents) {
            Ok(entries) => entries,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(path = %self.path.display(), error = %_e, "Activation registry is not a JSON list, ignoring it");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match ActivationRecord::deserialize(entry) {
                Ok(record) => Some(record),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    warn!(error = %_e, "Skipping malformed activation record");
                    None
                }
            })
            .collect()
    }

    /// Replace the file contents with `records`.
    pub fn save(&self, records: &[ActivationRecord]) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.path, json).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Record a freshly acquired activation, stamped now.
    pub fn track(
        &self,
        activation_id: &ActivationId,
        phone_number: &str,
    ) -> Result<(), RegistryError> {
        self.track_at(activation_id, phone_number, Utc::now())
    }

    /// Record an activation with an explicit creation time.
    ///
    /// An existing record with the same id is replaced.
    pub fn track_at(
        &self,
        activation_id: &ActivationId,
        phone_number: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let mut records = self.load();
        records.retain(|r| &r.activation_id != activation_id);
        records.push(ActivationRecord {
            activation_id: activation_id.clone(),
            phone_number: phone_number.to_string(),
            created_at: Some(created_at),
        });
        self.save(&records)?;

        #[cfg(feature = "tracing")]
        debug!(activation_id = %activation_id, phone_number, "Activation tracked");

        Ok(())
    }

    /// Drop every record with this id. Returns whether anything was removed.
    pub fn remove(&self, activation_id: &ActivationId) -> Result<bool, RegistryError> {
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| &r.activation_id != activation_id);

        if records.len() == before {
            return Ok(false);
        }

        self.save(&records)?;

        #[cfg(feature = "tracing")]
        info!(activation_id = %activation_id, "Activation removed from registry");

        Ok(true)
    }

    /// Look up a record.
    pub fn get(&self, activation_id: &ActivationId) -> Option<ActivationRecord> {
        self.load()
            .into_iter()
            .find(|r| &r.activation_id == activation_id)
    }

    /// Decide whether the activation may be cancelled at `now`.
    pub fn cancel_gate(
        &self,
        activation_id: &ActivationId,
        min_age: Duration,
        now: DateTime<Utc>,
    ) -> CancelGate {
        let Some(record) = self.get(activation_id) else {
            return CancelGate::NotTracked;
        };

        match record.age_at(now) {
            None => CancelGate::Allowed,
            Some(age) if age >= min_age => CancelGate::Allowed,
            Some(age) => CancelGate::TooEarly { age, min_age },
        }
    }

    /// `true` when a cancellation is permitted right now.
    pub fn can_cancel(&self, activation_id: &ActivationId, min_age: Duration) -> bool {
        self.can_cancel_at(activation_id, min_age, Utc::now())
    }

    pub fn can_cancel_at(
        &self,
        activation_id: &ActivationId,
        min_age: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        self.cancel_gate(activation_id, min_age, now).is_allowed()
    }
}

fn deserialize_activation_id<'de, D>(deserializer: D) -> Result<ActivationId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => ActivationId::new(id),
        RawId::Number(id) => ActivationId::new(id.to_string()),
    })
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    const MIN_AGE: Duration = Duration::from_secs(120);

    fn registry_in(dir: &tempfile::TempDir) -> ActivationRegistry {
        ActivationRegistry::new(dir.path().join("activations.json"))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(registry_in(&dir).load().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);

        let records = vec![
            ActivationRecord {
                activation_id: ActivationId::from("1"),
                phone_number: "6281234567".to_string(),
                created_at: Some(at(0)),
            },
            ActivationRecord {
                activation_id: ActivationId::from("2"),
                phone_number: "12025550123".to_string(),
                created_at: Some(Utc::now()),
            },
        ];

        registry.save(&records).unwrap();
        assert_eq!(registry.load(), records);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let registry = ActivationRegistry::new(dir.path().join("nested/state/activations.json"));

        registry.track(&ActivationId::from("7"), "79001234567").unwrap();
        assert_eq!(registry.load().len(), 1);
    }

    #[test]
    fn test_track_replaces_same_id() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);
        let id = ActivationId::from("42");

        registry.track_at(&id, "111", at(0)).unwrap();
        registry.track_at(&id, "222", at(10)).unwrap();

        let records = registry.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].phone_number, "222");
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);

        registry.track(&ActivationId::from("1"), "111").unwrap();
        registry.track(&ActivationId::from("2"), "222").unwrap();

        assert!(registry.remove(&ActivationId::from("1")).unwrap());
        assert!(!registry.remove(&ActivationId::from("1")).unwrap());

        let records = registry.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].activation_id.as_ref(), "2");
    }

    #[test]
    fn test_cancel_gate_by_age() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);
        let id = ActivationId::from("9");
        registry.track_at(&id, "111", at(0)).unwrap();

        assert!(!registry.can_cancel_at(&id, MIN_AGE, at(119)));
        assert!(registry.can_cancel_at(&id, MIN_AGE, at(120)));
        assert!(registry.can_cancel_at(&id, MIN_AGE, at(600)));

        assert_eq!(
            registry.cancel_gate(&id, MIN_AGE, at(30)),
            CancelGate::TooEarly {
                age: Duration::from_secs(30),
                min_age: MIN_AGE
            }
        );
    }

    #[test]
    fn test_cancel_gate_untracked() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);

        assert_eq!(
            registry.cancel_gate(&ActivationId::from("404"), MIN_AGE, at(0)),
            CancelGate::NotTracked
        );
    }

    #[test]
    fn test_missing_or_bad_timestamp_allows_cancel() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);
        std::fs::write(
            registry.path(),
            r#"[
                {"activation_id": "1", "phone_number": "111"},
                {"activation_id": "2", "phone_number": "222", "created_at": "yesterday"},
                {"activation_id": 3, "phone_number": "333", "created_at": null}
            ]"#,
        )
        .unwrap();

        for id in ["1", "2", "3"] {
            assert!(registry.can_cancel_at(&ActivationId::from(id), MIN_AGE, at(0)));
        }
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);
        std::fs::write(
            registry.path(),
            r#"[{"activation_id": "1", "phone_number": "111", "created_at": "2025-01-01T12:00:00.500000"}]"#,
        )
        .unwrap();

        let record = registry.get(&ActivationId::from("1")).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(500);
        assert_eq!(record.created_at, Some(expected));
    }

    #[test]
    fn test_non_list_document_is_empty() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);
        std::fs::write(registry.path(), r#"{"activation_id": "1"}"#).unwrap();

        assert!(registry.load().is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let dir = tempdir().unwrap();
        let registry = registry_in(&dir);
        std::fs::write(
            registry.path(),
            r#"[{"phone_number": "111"}, "junk", {"activation_id": "2", "phone_number": "222"}]"#,
        )
        .unwrap();

        let records = registry.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].activation_id.as_ref(), "2");
    }
}

//! Persistent store for the classifier configuration.
//!
//! The store holds at most one record: the administrator-edited
//! [`ClassifierConfig`] plus versioning metadata, serialised as JSON under
//! `<data_dir>/config/classifier.json`.
//!
//! Read semantics:
//! - no stored record → the bootstrap default is served;
//! - stored record older than 30 days → treated as expired, default served;
//! - stored record that fails validation (hand-edited file) → logged and
//!   ignored, default served. The classifier itself never falls back; the
//!   fallback decision lives here, with the caller.
//!
//! Write semantics: a candidate configuration is validated before anything
//! touches disk. On success the minor version is bumped and the record is
//! stamped with the updating administrator and time. On failure the stored
//! record is untouched, so the last-known-good configuration keeps serving.
//!
//! A config read racing a config write can serve slightly stale weights for
//! one request; that is an accepted outcome, not a correctness hazard.

use crate::classifier::ClassifierConfig;
use crate::config::CoreConfig;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;

/// Stored configurations older than this are ignored.
const CONFIG_TTL_DAYS: i64 = 30;

/// The persisted configuration record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(flatten)]
    pub config: ClassifierConfig,
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Where the effective configuration came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// The administrator-saved record.
    Stored,
    /// The bootstrap default (nothing stored, or stored record expired or
    /// invalid).
    Default,
}

/// The configuration the classifier should use right now.
#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    pub config: ClassifierConfig,
    pub source: ConfigSource,
    /// Version metadata, present only when `source` is `Stored`.
    pub version: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

/// File-backed store for the classifier configuration.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    cfg: Arc<CoreConfig>,
}

impl ConfigStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Returns the configuration to classify with right now.
    ///
    /// Never fails: every degraded state (missing, expired, unreadable,
    /// invalid) degrades to the bootstrap default so intake keeps working.
    pub fn effective(&self, now: DateTime<Utc>) -> EffectiveConfig {
        match self.read_stored() {
            Ok(Some(stored)) => {
                if now - stored.updated_at > Duration::days(CONFIG_TTL_DAYS) {
                    tracing::info!(
                        version = %stored.version,
                        updated_at = %stored.updated_at,
                        "stored classifier config expired; serving default"
                    );
                    return Self::default_config();
                }
                if let Err(e) = stored.config.validate() {
                    tracing::warn!("stored classifier config invalid ({e}); serving default");
                    return Self::default_config();
                }
                EffectiveConfig {
                    config: stored.config,
                    source: ConfigSource::Stored,
                    version: Some(stored.version),
                    updated_at: Some(stored.updated_at),
                    updated_by: Some(stored.updated_by),
                }
            }
            Ok(None) => Self::default_config(),
            Err(e) => {
                tracing::warn!("failed to read stored classifier config ({e}); serving default");
                Self::default_config()
            }
        }
    }

    /// Validates and persists a new configuration.
    ///
    /// Bumps the minor version of the stored record (or starts at `1.0`)
    /// and stamps the updating administrator. The previous record is only
    /// replaced once the candidate has passed validation.
    ///
    /// # Errors
    ///
    /// `TriageError::Configuration` if the candidate is invalid; storage
    /// errors if the record cannot be written.
    pub fn update(
        &self,
        candidate: ClassifierConfig,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> TriageResult<StoredConfig> {
        candidate.validate()?;
        let updated_by = updated_by.trim();
        if updated_by.is_empty() {
            return Err(TriageError::InvalidInput(
                "updated_by is required for config updates".into(),
            ));
        }

        let version = match self.read_stored() {
            Ok(Some(previous)) => bump_minor(&previous.version),
            _ => "1.0".to_string(),
        };

        let stored = StoredConfig {
            config: candidate,
            version,
            updated_at: now,
            updated_by: updated_by.to_string(),
        };

        let path = self.cfg.classifier_config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(TriageError::StorageDirCreation)?;
        }
        let json = serde_json::to_string_pretty(&stored).map_err(TriageError::Serialization)?;
        fs::write(&path, json).map_err(TriageError::FileWrite)?;

        tracing::info!(version = %stored.version, updated_by = %stored.updated_by,
            "classifier config updated");
        Ok(stored)
    }

    fn read_stored(&self) -> TriageResult<Option<StoredConfig>> {
        let path = self.cfg.classifier_config_path();
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(TriageError::FileRead)?;
        let stored = serde_json::from_str(&contents).map_err(TriageError::Deserialization)?;
        Ok(Some(stored))
    }

    fn default_config() -> EffectiveConfig {
        EffectiveConfig {
            config: ClassifierConfig::default(),
            source: ConfigSource::Default,
            version: None,
            updated_at: None,
            updated_by: None,
        }
    }
}

/// Bumps the minor component of a `major.minor` version string.
fn bump_minor(version: &str) -> String {
    let mut parts = version.splitn(2, '.');
    let major = parts.next().unwrap_or("1");
    let minor: u64 = parts
        .next()
        .and_then(|m| m.parse().ok())
        .unwrap_or_default();
    format!("{}.{}", major, minor + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg = Arc::new(CoreConfig::new(tmp.path().to_path_buf()).expect("config"));
        (tmp, ConfigStore::new(cfg))
    }

    #[test]
    fn serves_default_when_nothing_stored() {
        let (_tmp, store) = store();
        let effective = store.effective(Utc::now());
        assert_eq!(effective.source, ConfigSource::Default);
        assert_eq!(effective.config, ClassifierConfig::default());
        assert!(effective.version.is_none());
    }

    #[test]
    fn update_then_effective_round_trips() {
        let (_tmp, store) = store();
        let candidate = ClassifierConfig {
            w_age: 0.4,
            red_threshold: 0.8,
            ..ClassifierConfig::default()
        };
        let stored = store
            .update(candidate.clone(), "admin@hospital", Utc::now())
            .expect("update");
        assert_eq!(stored.version, "1.0");

        let effective = store.effective(Utc::now());
        assert_eq!(effective.source, ConfigSource::Stored);
        assert_eq!(effective.config, candidate);
        assert_eq!(effective.updated_by.as_deref(), Some("admin@hospital"));
    }

    #[test]
    fn minor_version_bumps_on_each_update() {
        let (_tmp, store) = store();
        let now = Utc::now();
        let config = ClassifierConfig::default();
        assert_eq!(store.update(config.clone(), "a", now).expect("v1").version, "1.0");
        assert_eq!(store.update(config.clone(), "a", now).expect("v2").version, "1.1");
        assert_eq!(store.update(config, "a", now).expect("v3").version, "1.2");
    }

    #[test]
    fn invalid_candidate_leaves_store_untouched() {
        let (_tmp, store) = store();
        let good = ClassifierConfig::default();
        store.update(good.clone(), "admin", Utc::now()).expect("seed");

        let bad = ClassifierConfig {
            w_age: 0.0,
            w_severity: 0.0,
            w_specialty: 0.0,
            w_symptoms: 0.0,
            ..ClassifierConfig::default()
        };
        let result = store.update(bad, "admin", Utc::now());
        assert!(matches!(result, Err(TriageError::Configuration(_))));

        let effective = store.effective(Utc::now());
        assert_eq!(effective.source, ConfigSource::Stored);
        assert_eq!(effective.config, good);
    }

    #[test]
    fn expired_record_degrades_to_default() {
        let (_tmp, store) = store();
        let saved_at = Utc::now() - Duration::days(31);
        store
            .update(ClassifierConfig::default(), "admin", saved_at)
            .expect("update");

        let effective = store.effective(Utc::now());
        assert_eq!(effective.source, ConfigSource::Default);
    }

    #[test]
    fn unreadable_record_degrades_to_default() {
        let (tmp, store) = store();
        let path = tmp.path().join("config");
        fs::create_dir_all(&path).expect("mkdir");
        fs::write(path.join("classifier.json"), "not json").expect("write");

        let effective = store.effective(Utc::now());
        assert_eq!(effective.source, ConfigSource::Default);
    }

    #[test]
    fn bump_minor_tolerates_garbage() {
        assert_eq!(bump_minor("1.0"), "1.1");
        assert_eq!(bump_minor("2.9"), "2.10");
        assert_eq!(bump_minor("weird"), "weird.1");
    }
}

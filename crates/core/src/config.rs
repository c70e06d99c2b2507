//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services as `Arc<CoreConfig>`. Request handlers never read
//! process-wide environment variables, which keeps behaviour consistent
//! across multi-threaded runtimes and test harnesses.

use crate::{TriageError, TriageResult};
use std::path::{Path, PathBuf};

/// Directory under the data dir holding referral records.
pub const REFERRALS_DIR_NAME: &str = "referrals";
/// Directory under the data dir holding the classifier configuration.
pub const CONFIG_DIR_NAME: &str = "config";
/// Directory under the data dir holding the notification outbox.
pub const NOTIFICATIONS_DIR_NAME: &str = "notifications";

/// Default data directory when `RETRIA_DATA_DIR` is not set.
pub const DEFAULT_DATA_DIR: &str = "/retria_data";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at `data_dir`.
    ///
    /// The directory must already exist; services create the subdirectories
    /// they need on first write.
    pub fn new(data_dir: PathBuf) -> TriageResult<Self> {
        if !data_dir.is_dir() {
            return Err(TriageError::InvalidInput(format!(
                "data directory does not exist: {}",
                data_dir.display()
            )));
        }
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn referrals_dir(&self) -> PathBuf {
        self.data_dir.join(REFERRALS_DIR_NAME)
    }

    pub fn classifier_config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_DIR_NAME).join("classifier.json")
    }

    pub fn notifications_dir(&self) -> PathBuf {
        self.data_dir.join(NOTIFICATIONS_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_data_dir() {
        let result = CoreConfig::new(PathBuf::from("/definitely/not/here"));
        assert!(matches!(result, Err(TriageError::InvalidInput(_))));
    }

    #[test]
    fn derives_subdirectories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg = CoreConfig::new(tmp.path().to_path_buf()).expect("config");
        assert_eq!(cfg.referrals_dir(), tmp.path().join("referrals"));
        assert_eq!(
            cfg.classifier_config_path(),
            tmp.path().join("config").join("classifier.json")
        );
    }
}

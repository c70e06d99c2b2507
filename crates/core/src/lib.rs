//! # Retria Core
//!
//! Core business logic for the referral triage system:
//! - Rule-based ROJO/VERDE priority classification of incoming referrals
//! - Referral intake, queries, and decision recording over sharded JSON
//!   storage under the configured data directory
//! - Administrator-edited classifier configuration with versioning and a
//!   bootstrap default
//! - Notification outbox and dashboard reporting
//!
//! **No API concerns**: HTTP servers, wire DTOs, and OpenAPI documentation
//! belong in `api-rest` and `api-shared`.

pub mod classifier;
pub mod config;
pub mod config_store;
pub mod error;
pub mod model;
pub mod notifications;
pub mod reporting;
pub mod repositories;
pub mod storage;

pub use classifier::{classify, Classification, ClassifierConfig, ClinicalPicture};
pub use config::CoreConfig;
pub use config_store::{ConfigSource, ConfigStore, EffectiveConfig, StoredConfig};
pub use error::{TriageError, TriageResult};
pub use model::{
    Decision, DecisionOutcome, Priority, Referral, ReferralStatus, Severity,
};
pub use notifications::NotificationService;
pub use reporting::{DailyReport, ReportService, WeeklyReport};
pub use repositories::{
    DecisionRequest, ReferralDetail, ReferralFilter, ReferralService, ReferralSubmission,
};
pub use retria_types::NonEmptyText;
pub use storage::RecordId;

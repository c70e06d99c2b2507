//! Referral intake, queries, and decision recording.
//!
//! ## Storage layout
//!
//! Referrals are stored as JSON in a sharded structure:
//!
//! ```text
//! referrals/
//!   <s1>/
//!     <s2>/
//!       <uuid>/
//!         referral.json    # the classified request
//!         decision.json    # written once, when a human decides
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the UUID.
//!
//! ## Workflow rules
//!
//! - A referral is classified before it is persisted, so every record a
//!   decision-maker can see already carries a priority and score.
//! - The classifier configuration comes from the [`ConfigStore`]; a
//!   degraded store serves the bootstrap default, so intake never blocks on
//!   configuration problems.
//! - `decision.json` is written at most once. A second decision attempt
//!   fails with [`TriageError::AlreadyDecided`].
//! - Notification failures are logged, not propagated: the outbox is
//!   advisory and must not undo an otherwise-committed intake or decision.

use crate::classifier::{classify, normalise_symptoms, ClinicalPicture};
use crate::config::CoreConfig;
use crate::config_store::ConfigStore;
use crate::model::{
    generate_request_code, Decision, DecisionOutcome, Referral, ReferralStatus, Severity,
};
use crate::notifications::NotificationService;
use crate::storage::{walk_record_dirs, RecordId};
use crate::{TriageError, TriageResult};
use chrono::{DateTime, NaiveDate, Utc};
use retria_types::NonEmptyText;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const REFERRAL_FILE: &str = "referral.json";
const DECISION_FILE: &str = "decision.json";

/// Upper bound for free-text fields submitted over the API.
const MAX_TEXT_LEN: usize = 1000;

/// A referral submission from a referring clinic, before classification.
#[derive(Clone, Debug)]
pub struct ReferralSubmission {
    pub patient_name: String,
    pub patient_document: String,
    pub patient_age: u32,
    pub diagnosis: String,
    pub symptoms: Vec<String>,
    pub specialty: String,
    pub severity: Severity,
    pub reason: Option<String>,
}

/// Status/priority filter for listings. `None` fields match everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferralFilter {
    pub status: Option<ReferralStatus>,
    pub priority: Option<crate::model::Priority>,
}

/// A referral together with its decision, if one has been recorded.
#[derive(Clone, Debug)]
pub struct ReferralDetail {
    pub referral: Referral,
    pub decision: Option<Decision>,
}

/// A physician's decision on a pending referral.
#[derive(Clone, Debug)]
pub struct DecisionRequest {
    pub outcome: DecisionOutcome,
    pub justification: String,
    pub decided_by: String,
    pub assigned_specialist: Option<String>,
    pub appointment_date: Option<NaiveDate>,
}

/// Service for managing referral records end to end.
#[derive(Clone, Debug)]
pub struct ReferralService {
    cfg: Arc<CoreConfig>,
    config_store: ConfigStore,
    notifications: NotificationService,
}

impl ReferralService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            config_store: ConfigStore::new(cfg.clone()),
            notifications: NotificationService::new(cfg.clone()),
            cfg,
        }
    }

    /// Accepts a submission: validates, classifies, persists, notifies.
    ///
    /// # Errors
    ///
    /// - `TriageError::InvalidInput` for missing patient fields (nothing is
    ///   persisted);
    /// - storage errors if the record cannot be written.
    pub fn submit(&self, submission: ReferralSubmission) -> TriageResult<Referral> {
        let patient_name = NonEmptyText::bounded(&submission.patient_name, 255)
            .map_err(|e| TriageError::InvalidInput(format!("patient_name: {e}")))?;
        let patient_document = NonEmptyText::bounded(&submission.patient_document, 20)
            .map_err(|e| TriageError::InvalidInput(format!("patient_document: {e}")))?;
        let diagnosis = NonEmptyText::bounded(&submission.diagnosis, MAX_TEXT_LEN)
            .map_err(|e| TriageError::InvalidInput(format!("diagnosis: {e}")))?;

        let now = Utc::now();
        let picture = ClinicalPicture {
            age: submission.patient_age,
            severity: submission.severity,
            specialty: submission.specialty.trim().to_string(),
            // Canonical tokens; the record stores exactly what was scored.
            symptoms: normalise_symptoms(&submission.symptoms),
        };
        let effective = self.config_store.effective(now);
        let classification = classify(&picture, &effective.config)?;

        let id = RecordId::generate();
        let referral = Referral {
            id: id.as_str().to_string(),
            code: self.fresh_request_code(now),
            patient_name: patient_name.into_string(),
            patient_document: patient_document.into_string(),
            patient_age: submission.patient_age,
            diagnosis: diagnosis.into_string(),
            symptoms: picture.symptoms,
            specialty: picture.specialty,
            reason: submission.reason.filter(|r| !r.trim().is_empty()),
            priority: classification.priority,
            score: classification.score,
            confidence: classification.confidence,
            factors: classification.factors,
            status: ReferralStatus::Pending,
            created_at: now,
            deadline: now + classification.priority.decision_window(),
            decided_at: None,
        };

        let dir = id.shard_dir(&self.cfg.referrals_dir());
        fs::create_dir_all(&dir).map_err(TriageError::ReferralDirCreation)?;
        write_json(&dir.join(REFERRAL_FILE), &referral)?;

        tracing::info!(code = %referral.code, priority = %referral.priority.as_str(),
            score = referral.score, "referral submitted");

        if let Err(e) = self.notifications.notify_intake(&referral, now) {
            tracing::warn!("failed to write intake notification: {e}");
        }

        Ok(referral)
    }

    /// Fetches a referral and its decision, if any.
    pub fn get(&self, id: &str) -> TriageResult<ReferralDetail> {
        let record_id = RecordId::parse(id)?;
        let dir = record_id.shard_dir(&self.cfg.referrals_dir());
        let referral_path = dir.join(REFERRAL_FILE);
        if !referral_path.is_file() {
            return Err(TriageError::NotFound(id.to_string()));
        }
        let referral: Referral = read_json(&referral_path)?;
        let decision_path = dir.join(DECISION_FILE);
        let decision = if decision_path.is_file() {
            Some(read_json(&decision_path)?)
        } else {
            None
        };
        Ok(ReferralDetail { referral, decision })
    }

    /// Lists referrals matching `filter`, newest first.
    pub fn list(&self, filter: ReferralFilter) -> Vec<Referral> {
        let mut referrals: Vec<Referral> = self
            .load_all()
            .into_iter()
            .filter(|r| {
                filter.status.map_or(true, |s| r.status == s)
                    && filter.priority.map_or(true, |p| r.priority == p)
            })
            .collect();
        referrals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        referrals
    }

    /// Pending referrals whose decision deadline falls within the next
    /// `hours` hours (overdue ones included), most urgent first.
    pub fn due_soon(&self, hours: i64, now: DateTime<Utc>) -> Vec<Referral> {
        let mut due: Vec<Referral> = self
            .load_all()
            .into_iter()
            .filter(|r| r.due_within(now, hours))
            .collect();
        due.sort_by(|a, b| a.deadline.cmp(&b.deadline));
        due
    }

    /// Records a human decision and flips the referral status, exactly once.
    ///
    /// # Errors
    ///
    /// - `TriageError::NotFound` if no such referral exists;
    /// - `TriageError::AlreadyDecided` if the referral is no longer pending
    ///   or a decision record already exists;
    /// - `TriageError::InvalidInput` for a missing justification or decider.
    pub fn decide(&self, id: &str, request: DecisionRequest) -> TriageResult<Decision> {
        let justification = NonEmptyText::bounded(&request.justification, MAX_TEXT_LEN)
            .map_err(|e| TriageError::InvalidInput(format!("justification: {e}")))?;
        let decided_by = NonEmptyText::bounded(&request.decided_by, 255)
            .map_err(|e| TriageError::InvalidInput(format!("decided_by: {e}")))?;

        let record_id = RecordId::parse(id)?;
        let dir = record_id.shard_dir(&self.cfg.referrals_dir());
        let referral_path = dir.join(REFERRAL_FILE);
        if !referral_path.is_file() {
            return Err(TriageError::NotFound(id.to_string()));
        }
        let mut referral: Referral = read_json(&referral_path)?;

        let decision_path = dir.join(DECISION_FILE);
        if !referral.is_pending() || decision_path.is_file() {
            return Err(TriageError::AlreadyDecided(referral.code));
        }

        let now = Utc::now();
        let decision = Decision {
            referral_id: referral.id.clone(),
            outcome: request.outcome,
            justification: justification.into_string(),
            decided_by: decided_by.into_string(),
            assigned_specialist: request
                .assigned_specialist
                .filter(|s| !s.trim().is_empty()),
            appointment_date: request.appointment_date,
            decided_at: now,
        };

        // The decision record is the source of truth; write it before the
        // status flip so a crash between the two writes cannot lose it.
        write_json(&decision_path, &decision)?;

        referral.status = request.outcome.resulting_status();
        referral.decided_at = Some(now);
        write_json(&referral_path, &referral)?;

        tracing::info!(code = %referral.code, outcome = %decision.outcome.as_str(),
            decided_by = %decision.decided_by, "referral decided");

        if let Err(e) = self.notifications.notify_decision(&referral, &decision, now) {
            tracing::warn!("failed to write decision notification: {e}");
        }

        Ok(decision)
    }

    /// All referrals with their decisions; used by reporting.
    pub fn all_with_decisions(&self) -> Vec<ReferralDetail> {
        let mut details = Vec::new();
        walk_record_dirs(&self.cfg.referrals_dir(), |dir| {
            let referral_path = dir.join(REFERRAL_FILE);
            let referral: Referral = match read_json(&referral_path) {
                Ok(r) => r,
                Err(_) => {
                    if referral_path.exists() {
                        tracing::warn!("failed to parse referral: {}", referral_path.display());
                    }
                    return;
                }
            };
            let decision_path = dir.join(DECISION_FILE);
            let decision = read_json(&decision_path).ok();
            details.push(ReferralDetail { referral, decision });
        });
        details
    }

    fn load_all(&self) -> Vec<Referral> {
        self.all_with_decisions()
            .into_iter()
            .map(|d| d.referral)
            .collect()
    }

    /// Generates a request code not already in use. The random suffix space
    /// is large enough that this effectively never loops.
    fn fresh_request_code(&self, now: DateTime<Utc>) -> String {
        let existing: std::collections::HashSet<String> =
            self.load_all().into_iter().map(|r| r.code).collect();
        loop {
            let code = generate_request_code(now);
            if !existing.contains(&code) {
                return code;
            }
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> TriageResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(TriageError::Serialization)?;
    fs::write(path, json).map_err(TriageError::FileWrite)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> TriageResult<T> {
    let contents = fs::read_to_string(path).map_err(TriageError::FileRead)?;
    serde_json::from_str(&contents).map_err(TriageError::Deserialization)
}

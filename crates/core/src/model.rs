//! Domain model for referral triage.
//!
//! Responsibilities:
//! - Define the persisted record types (`Referral`, `Decision`,
//!   `Notification`) and the enumerations that appear on the wire
//! - Enforce the record invariants at the type level where possible:
//!   priority and score are present on every `Referral` from the moment it
//!   is constructed, and a `Decision` is created whole and never mutated
//! - Generate human-facing request codes (`REF-<year>-<6 digits>`)
//!
//! Notes:
//! - Wire string forms: priority uses the clinical labels `ROJO`/`VERDE`;
//!   status and decision outcomes use `PENDING`/`ACCEPTED`/`REJECTED`.
//! - Severity (`alta`/`media`/`baja`) is reported by the referring clinic;
//!   anything else parses as `Unknown` rather than failing intake.

use crate::classifier::FactorBreakdown;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Priority bucket assigned by the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Critical referral: must be seen urgently.
    #[serde(rename = "ROJO")]
    Rojo,
    /// Routine referral.
    #[serde(rename = "VERDE")]
    Verde,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Rojo => "ROJO",
            Priority::Verde => "VERDE",
        }
    }

    /// Parse from the wire label.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "ROJO" => Some(Priority::Rojo),
            "VERDE" => Some(Priority::Verde),
            _ => None,
        }
    }

    /// Time allowed for a human decision, from intake.
    ///
    /// Critical referrals get two hours; routine referrals three days.
    pub fn decision_window(&self) -> Duration {
        match self {
            Priority::Rojo => Duration::hours(2),
            Priority::Verde => Duration::hours(72),
        }
    }
}

/// Clinic-reported severity of the patient's condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Alta,
    Media,
    Baja,
    Unknown,
}

impl Severity {
    /// Parse a clinic-supplied severity string. Unrecognised values map to
    /// `Unknown` so that a sloppy upstream form cannot block intake.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "alta" => Severity::Alta,
            "media" => Severity::Media,
            "baja" => Severity::Baja,
            _ => Severity::Unknown,
        }
    }
}

/// Lifecycle state of a referral request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferralStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "PENDING",
            ReferralStatus::Accepted => "ACCEPTED",
            ReferralStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ReferralStatus::Pending),
            "ACCEPTED" => Some(ReferralStatus::Accepted),
            "REJECTED" => Some(ReferralStatus::Rejected),
            _ => None,
        }
    }
}

/// Outcome of a human decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionOutcome {
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl DecisionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionOutcome::Accepted => "ACCEPTED",
            DecisionOutcome::Rejected => "REJECTED",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "ACCEPTED" => Some(DecisionOutcome::Accepted),
            "REJECTED" => Some(DecisionOutcome::Rejected),
            _ => None,
        }
    }

    /// The referral status this outcome transitions to.
    pub fn resulting_status(&self) -> ReferralStatus {
        match self {
            DecisionOutcome::Accepted => ReferralStatus::Accepted,
            DecisionOutcome::Rejected => ReferralStatus::Rejected,
        }
    }
}

/// A persisted referral request (solicitud de referencia).
///
/// Priority and score are assigned exactly once, when the record is
/// constructed at intake; status is flipped exactly once by a decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Referral {
    pub id: String,
    pub code: String,
    pub patient_name: String,
    pub patient_document: String,
    pub patient_age: u32,
    pub diagnosis: String,
    pub symptoms: Vec<String>,
    pub specialty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub priority: Priority,
    pub score: f64,
    pub confidence: f64,
    pub factors: FactorBreakdown,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl Referral {
    pub fn is_pending(&self) -> bool {
        self.status == ReferralStatus::Pending
    }

    /// Whether the decision deadline falls within the next `hours` hours.
    /// Already-overdue pending referrals count as due.
    pub fn due_within(&self, now: DateTime<Utc>, hours: i64) -> bool {
        self.is_pending() && self.deadline <= now + Duration::hours(hours)
    }
}

/// A human accept/reject decision. Created once, immutable thereafter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Decision {
    pub referral_id: String,
    pub outcome: DecisionOutcome,
    pub justification: String,
    pub decided_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_specialist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<chrono::NaiveDate>,
    pub decided_at: DateTime<Utc>,
}

/// Urgency of a notification, as shown to its recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationUrgency {
    Alta,
    Media,
}

/// An outbox record describing an event a user should hear about.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_role: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub urgency: NotificationUrgency,
    pub referral_id: String,
    pub created_at: DateTime<Utc>,
}

/// Generates a human-facing request code: `REF-<year>-<6 digits>`.
///
/// The suffix is random; collision handling (regenerate and retry) is the
/// caller's responsibility since only the caller can see the existing codes.
pub fn generate_request_code(now: DateTime<Utc>) -> String {
    use chrono::Datelike;
    let suffix: u32 = rand::thread_rng().gen_range(1..=999_999);
    format!("REF-{}-{:06}", now.year(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_wire_labels_are_clinical() {
        assert_eq!(Priority::Rojo.as_str(), "ROJO");
        assert_eq!(Priority::from_wire("VERDE"), Some(Priority::Verde));
        assert_eq!(Priority::from_wire("AMARILLO"), None);
    }

    #[test]
    fn severity_parse_tolerates_unknown_values() {
        assert_eq!(Severity::parse(" Alta "), Severity::Alta);
        assert_eq!(Severity::parse("critical"), Severity::Unknown);
        assert_eq!(Severity::parse(""), Severity::Unknown);
    }

    #[test]
    fn rojo_window_is_shorter_than_verde() {
        assert!(Priority::Rojo.decision_window() < Priority::Verde.decision_window());
    }

    #[test]
    fn request_code_shape() {
        let code = generate_request_code(Utc::now());
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "REF");
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn due_within_counts_overdue_pending() {
        let now = Utc::now();
        let referral = sample_referral(now - Duration::hours(5), now - Duration::hours(1));
        assert!(referral.due_within(now, 2));
    }

    fn sample_referral(created: DateTime<Utc>, deadline: DateTime<Utc>) -> Referral {
        Referral {
            id: "550e8400e29b41d4a716446655440000".into(),
            code: "REF-2026-000001".into(),
            patient_name: "Ana Pérez".into(),
            patient_document: "CC-1001".into(),
            patient_age: 70,
            diagnosis: "síndrome coronario agudo".into(),
            symptoms: vec!["dolor_toracico".into()],
            specialty: "Cardiología".into(),
            reason: None,
            priority: Priority::Rojo,
            score: 0.78,
            confidence: 0.66,
            factors: FactorBreakdown::default(),
            status: ReferralStatus::Pending,
            created_at: created,
            deadline,
            decided_at: None,
        }
    }
}

//! Notification outbox.
//!
//! Workflow events that someone should hear about are written as JSON
//! records under `<data_dir>/notifications/`, one file per notification.
//! Delivery (email, SMS, websockets) is a separate concern; this module
//! only records what happened and for whom:
//!
//! - intake: physicians are told a new referral arrived, with urgency
//!   `alta` when the classifier said ROJO;
//! - decision: the requesting clinic is told the outcome, with urgency
//!   `alta` for acceptances.

use crate::config::CoreConfig;
use crate::model::{
    Decision, DecisionOutcome, Notification, NotificationUrgency, Priority, Referral,
};
use crate::storage::RecordId;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};
use std::fs;
use std::sync::Arc;

/// Recipient role for intake notifications.
pub const ROLE_MEDICO: &str = "medico";
/// Recipient role for decision notifications.
pub const ROLE_IPS: &str = "ips";

/// Writes and lists outbox records.
#[derive(Clone, Debug)]
pub struct NotificationService {
    cfg: Arc<CoreConfig>,
}

impl NotificationService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Records an intake event for the physician queue.
    pub fn notify_intake(&self, referral: &Referral, now: DateTime<Utc>) -> TriageResult<()> {
        let urgency = match referral.priority {
            Priority::Rojo => NotificationUrgency::Alta,
            Priority::Verde => NotificationUrgency::Media,
        };
        self.write(Notification {
            id: RecordId::generate().as_str().to_string(),
            recipient_role: ROLE_MEDICO.into(),
            kind: "referral_submitted".into(),
            title: "Nueva solicitud de referencia".into(),
            body: format!(
                "Solicitud {} con prioridad {} para {}",
                referral.code,
                referral.priority.as_str(),
                referral.patient_name
            ),
            urgency,
            referral_id: referral.id.clone(),
            created_at: now,
        })
    }

    /// Records a decision event for the requesting clinic.
    pub fn notify_decision(
        &self,
        referral: &Referral,
        decision: &Decision,
        now: DateTime<Utc>,
    ) -> TriageResult<()> {
        let urgency = match decision.outcome {
            DecisionOutcome::Accepted => NotificationUrgency::Alta,
            DecisionOutcome::Rejected => NotificationUrgency::Media,
        };
        self.write(Notification {
            id: RecordId::generate().as_str().to_string(),
            recipient_role: ROLE_IPS.into(),
            kind: "referral_decided".into(),
            title: "Evaluación de solicitud completada".into(),
            body: format!(
                "Solicitud {} fue {}. {}",
                referral.code,
                decision.outcome.as_str(),
                decision.justification
            ),
            urgency,
            referral_id: referral.id.clone(),
            created_at: now,
        })
    }

    /// Lists outbox records, newest first, optionally filtered by recipient
    /// role. Unparseable files are logged and skipped.
    pub fn list(&self, role: Option<&str>) -> Vec<Notification> {
        let dir = self.cfg.notifications_dir();
        let mut notifications = Vec::new();
        let entries = match fs::read_dir(&dir) {
            Ok(it) => it,
            Err(_) => return notifications,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .ok()
                .and_then(|c| serde_json::from_str::<Notification>(&c).ok())
            {
                Some(notification) => {
                    if role.map_or(true, |r| notification.recipient_role == r) {
                        notifications.push(notification);
                    }
                }
                None => tracing::warn!("failed to parse notification: {}", path.display()),
            }
        }
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    fn write(&self, notification: Notification) -> TriageResult<()> {
        let dir = self.cfg.notifications_dir();
        fs::create_dir_all(&dir).map_err(TriageError::StorageDirCreation)?;
        let json =
            serde_json::to_string_pretty(&notification).map_err(TriageError::Serialization)?;
        let path = dir.join(format!("{}.json", notification.id));
        fs::write(path, json).map_err(TriageError::FileWrite)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FactorBreakdown;
    use crate::model::ReferralStatus;

    fn service() -> (tempfile::TempDir, NotificationService) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg = Arc::new(CoreConfig::new(tmp.path().to_path_buf()).expect("config"));
        (tmp, NotificationService::new(cfg))
    }

    fn referral(priority: Priority) -> Referral {
        let now = Utc::now();
        Referral {
            id: RecordId::generate().as_str().to_string(),
            code: "REF-2026-000123".into(),
            patient_name: "Luis Gómez".into(),
            patient_document: "CC-2002".into(),
            patient_age: 30,
            diagnosis: "lesión cutánea".into(),
            symptoms: vec![],
            specialty: "Dermatología".into(),
            reason: None,
            priority,
            score: 0.2,
            confidence: 0.7,
            factors: FactorBreakdown::default(),
            status: ReferralStatus::Pending,
            created_at: now,
            deadline: now + chrono::Duration::hours(72),
            decided_at: None,
        }
    }

    #[test]
    fn intake_of_rojo_is_alta_urgency_for_physicians() {
        let (_tmp, service) = service();
        service
            .notify_intake(&referral(Priority::Rojo), Utc::now())
            .expect("notify");

        let listed = service.list(Some(ROLE_MEDICO));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].urgency, NotificationUrgency::Alta);
        assert_eq!(listed[0].kind, "referral_submitted");
        assert!(service.list(Some(ROLE_IPS)).is_empty());
    }

    #[test]
    fn decision_notifies_requesting_clinic() {
        let (_tmp, service) = service();
        let referral = referral(Priority::Verde);
        let decision = Decision {
            referral_id: referral.id.clone(),
            outcome: DecisionOutcome::Rejected,
            justification: "fuera de alcance del servicio".into(),
            decided_by: "dr.ortiz".into(),
            assigned_specialist: None,
            appointment_date: None,
            decided_at: Utc::now(),
        };
        service
            .notify_decision(&referral, &decision, Utc::now())
            .expect("notify");

        let listed = service.list(Some(ROLE_IPS));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].urgency, NotificationUrgency::Media);
        assert!(listed[0].body.contains("REJECTED"));
    }

    #[test]
    fn list_is_newest_first() {
        let (_tmp, service) = service();
        let base = Utc::now();
        for offset in [2i64, 0, 1] {
            service
                .notify_intake(
                    &referral(Priority::Verde),
                    base - chrono::Duration::minutes(offset),
                )
                .expect("notify");
        }
        let listed = service.list(None);
        assert_eq!(listed.len(), 3);
        assert!(listed[0].created_at >= listed[1].created_at);
        assert!(listed[1].created_at >= listed[2].created_at);
    }
}

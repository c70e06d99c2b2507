//! Translation between core domain types and wire DTOs.
//!
//! Timestamps leave as RFC 3339 strings, dates as `YYYY-MM-DD`. Enum
//! parsing lives here too, so handlers only deal with domain types.

use api_shared as wire;
use retria_core::classifier::{FactorBreakdown, FactorScore};
use retria_core::model::{Notification, NotificationUrgency};
use retria_core::reporting::{DailyReport, WeeklyReport};
use retria_core::{Decision, DecisionOutcome, Referral};

pub fn referral(r: &Referral) -> wire::ReferralDto {
    wire::ReferralDto {
        id: r.id.clone(),
        code: r.code.clone(),
        patient_name: r.patient_name.clone(),
        patient_document: r.patient_document.clone(),
        patient_age: r.patient_age,
        diagnosis: r.diagnosis.clone(),
        symptoms: r.symptoms.clone(),
        specialty: r.specialty.clone(),
        reason: r.reason.clone(),
        priority: r.priority.as_str().to_string(),
        score: r.score,
        confidence: r.confidence,
        factors: factors(&r.factors),
        status: r.status.as_str().to_string(),
        created_at: r.created_at.to_rfc3339(),
        deadline: r.deadline.to_rfc3339(),
        decided_at: r.decided_at.map(|t| t.to_rfc3339()),
    }
}

pub fn decision(d: &Decision) -> wire::DecisionDto {
    wire::DecisionDto {
        referral_id: d.referral_id.clone(),
        outcome: d.outcome.as_str().to_string(),
        justification: d.justification.clone(),
        decided_by: d.decided_by.clone(),
        assigned_specialist: d.assigned_specialist.clone(),
        appointment_date: d.appointment_date.map(|date| date.to_string()),
        decided_at: d.decided_at.to_rfc3339(),
    }
}

pub fn factors(f: &FactorBreakdown) -> wire::FactorBreakdownDto {
    wire::FactorBreakdownDto {
        age: factor(&f.age),
        severity: factor(&f.severity),
        specialty: factor(&f.specialty),
        symptoms: factor(&f.symptoms),
    }
}

fn factor(f: &FactorScore) -> wire::FactorScoreDto {
    wire::FactorScoreDto {
        impact: f.impact,
        description: f.description.clone(),
    }
}

pub fn notification(n: &Notification) -> wire::NotificationDto {
    wire::NotificationDto {
        id: n.id.clone(),
        recipient_role: n.recipient_role.clone(),
        kind: n.kind.clone(),
        title: n.title.clone(),
        body: n.body.clone(),
        urgency: match n.urgency {
            NotificationUrgency::Alta => "alta".into(),
            NotificationUrgency::Media => "media".into(),
        },
        referral_id: n.referral_id.clone(),
        created_at: n.created_at.to_rfc3339(),
    }
}

pub fn daily_report(r: &DailyReport) -> wire::DailyReportRes {
    wire::DailyReportRes {
        date: r.date.to_string(),
        total: r.total,
        rojo: r.rojo,
        verde: r.verde,
        processed: r.processed,
        pending: r.pending,
        mean_score: r.mean_score,
    }
}

pub fn weekly_report(r: &WeeklyReport) -> wire::WeeklyReportRes {
    wire::WeeklyReportRes {
        start: r.start.to_string(),
        end: r.end.to_string(),
        submissions_per_day: r
            .submissions_per_day
            .iter()
            .map(|d| wire::DayCountDto {
                date: d.date.to_string(),
                total: d.total,
            })
            .collect(),
        decisions_per_decider: r
            .decisions_per_decider
            .iter()
            .map(|d| wire::DeciderCountDto {
                decided_by: d.decided_by.clone(),
                total: d.total,
            })
            .collect(),
        mean_decision_hours: r.mean_decision_hours,
    }
}

/// Parses a wire outcome string (`ACCEPTED`/`REJECTED`).
pub fn parse_outcome(s: &str) -> Option<DecisionOutcome> {
    DecisionOutcome::from_wire(s)
}

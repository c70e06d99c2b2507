//! Dashboard reporting over stored referrals.
//!
//! Reports are computed by scanning the referral store in full. Volumes are
//! dashboard-scale (a hospital's referral traffic), so a linear walk over
//! small JSON files is deliberate; there is no index to maintain or drift.

use crate::model::{Priority, ReferralStatus};
use crate::repositories::{ReferralDetail, ReferralService};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts and averages for a single day's intake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub total: u64,
    pub rojo: u64,
    pub verde: u64,
    pub processed: u64,
    pub pending: u64,
    /// Mean classifier score over the day's submissions; absent when there
    /// were none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
}

/// Submissions for one day within a weekly report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub total: u64,
}

/// Decisions recorded by one physician within a weekly report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeciderCount {
    pub decided_by: String,
    pub total: u64,
}

/// A seven-day summary starting at `start`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub submissions_per_day: Vec<DayCount>,
    pub decisions_per_decider: Vec<DeciderCount>,
    /// Mean hours from intake to decision, over decisions made in the
    /// window; absent when there were none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_decision_hours: Option<f64>,
}

/// Computes dashboard reports from the referral store.
#[derive(Clone, Debug)]
pub struct ReportService {
    referrals: ReferralService,
}

impl ReportService {
    pub fn new(referrals: ReferralService) -> Self {
        Self { referrals }
    }

    /// Aggregates the referrals submitted on `date`.
    pub fn daily(&self, date: NaiveDate) -> DailyReport {
        let todays: Vec<ReferralDetail> = self
            .referrals
            .all_with_decisions()
            .into_iter()
            .filter(|d| d.referral.created_at.date_naive() == date)
            .collect();

        let total = todays.len() as u64;
        let rojo = count(&todays, |d| d.referral.priority == Priority::Rojo);
        let verde = count(&todays, |d| d.referral.priority == Priority::Verde);
        let pending = count(&todays, |d| d.referral.status == ReferralStatus::Pending);
        let mean_score = if todays.is_empty() {
            None
        } else {
            Some(todays.iter().map(|d| d.referral.score).sum::<f64>() / total as f64)
        };

        DailyReport {
            date,
            total,
            rojo,
            verde,
            processed: total - pending,
            pending,
            mean_score,
        }
    }

    /// Aggregates the seven days starting at `start`.
    pub fn weekly(&self, start: NaiveDate) -> WeeklyReport {
        let end = start + Duration::days(6);
        let details = self.referrals.all_with_decisions();

        let mut per_day: BTreeMap<NaiveDate, u64> = (0..7)
            .map(|offset| (start + Duration::days(offset), 0))
            .collect();
        for detail in &details {
            let date = detail.referral.created_at.date_naive();
            if let Some(slot) = per_day.get_mut(&date) {
                *slot += 1;
            }
        }

        let mut per_decider: BTreeMap<String, u64> = BTreeMap::new();
        let mut latency_hours = Vec::new();
        for detail in &details {
            let Some(decision) = &detail.decision else {
                continue;
            };
            let date = decision.decided_at.date_naive();
            if date < start || date > end {
                continue;
            }
            *per_decider.entry(decision.decided_by.clone()).or_default() += 1;
            let latency = decision.decided_at - detail.referral.created_at;
            latency_hours.push(latency.num_minutes() as f64 / 60.0);
        }

        let mean_decision_hours = if latency_hours.is_empty() {
            None
        } else {
            Some(latency_hours.iter().sum::<f64>() / latency_hours.len() as f64)
        };

        WeeklyReport {
            start,
            end,
            submissions_per_day: per_day
                .into_iter()
                .map(|(date, total)| DayCount { date, total })
                .collect(),
            decisions_per_decider: per_decider
                .into_iter()
                .map(|(decided_by, total)| DeciderCount { decided_by, total })
                .collect(),
            mean_decision_hours,
        }
    }
}

/// Renders a daily report as a two-line CSV document.
pub fn render_daily_csv(report: &DailyReport) -> String {
    let mean = report
        .mean_score
        .map(|s| format!("{s:.3}"))
        .unwrap_or_default();
    format!(
        "date,total,rojo,verde,processed,pending,mean_score\n{},{},{},{},{},{},{}\n",
        report.date, report.total, report.rojo, report.verde, report.processed, report.pending, mean
    )
}

fn count(details: &[ReferralDetail], predicate: impl Fn(&ReferralDetail) -> bool) -> u64 {
    details.iter().filter(|d| predicate(d)).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::model::{DecisionOutcome, Severity};
    use crate::repositories::{DecisionRequest, ReferralSubmission};
    use chrono::Utc;
    use std::sync::Arc;

    fn services() -> (tempfile::TempDir, ReferralService, ReportService) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg = Arc::new(CoreConfig::new(tmp.path().to_path_buf()).expect("config"));
        let referrals = ReferralService::new(cfg);
        let reports = ReportService::new(referrals.clone());
        (tmp, referrals, reports)
    }

    fn submission(age: u32, severity: Severity, specialty: &str) -> ReferralSubmission {
        ReferralSubmission {
            patient_name: "Paciente Prueba".into(),
            patient_document: "CC-3003".into(),
            patient_age: age,
            diagnosis: "diagnóstico presuntivo".into(),
            symptoms: vec![],
            specialty: specialty.into(),
            severity,
            reason: None,
        }
    }

    #[test]
    fn daily_report_counts_buckets() {
        let (_tmp, referrals, reports) = services();
        referrals
            .submit(submission(70, Severity::Alta, "Cardiología"))
            .expect("rojo");
        referrals
            .submit(submission(30, Severity::Baja, "Dermatología"))
            .expect("verde");

        let report = reports.daily(Utc::now().date_naive());
        assert_eq!(report.total, 2);
        assert_eq!(report.rojo, 1);
        assert_eq!(report.verde, 1);
        assert_eq!(report.pending, 2);
        assert_eq!(report.processed, 0);
        assert!(report.mean_score.is_some());
    }

    #[test]
    fn daily_report_for_empty_day() {
        let (_tmp, _referrals, reports) = services();
        let report = reports.daily(NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"));
        assert_eq!(report.total, 0);
        assert!(report.mean_score.is_none());
    }

    #[test]
    fn weekly_report_buckets_decisions_by_decider() {
        let (_tmp, referrals, reports) = services();
        let a = referrals
            .submit(submission(70, Severity::Alta, "Cardiología"))
            .expect("a");
        referrals
            .submit(submission(30, Severity::Baja, "Dermatología"))
            .expect("b");
        referrals
            .decide(
                &a.id,
                DecisionRequest {
                    outcome: DecisionOutcome::Accepted,
                    justification: "ingreso indicado".into(),
                    decided_by: "dr.ortiz".into(),
                    assigned_specialist: None,
                    appointment_date: None,
                },
            )
            .expect("decide");

        let today = Utc::now().date_naive();
        let report = reports.weekly(today - Duration::days(3));
        assert_eq!(report.submissions_per_day.len(), 7);
        let todays: u64 = report
            .submissions_per_day
            .iter()
            .filter(|d| d.date == today)
            .map(|d| d.total)
            .sum();
        assert_eq!(todays, 2);
        assert_eq!(report.decisions_per_decider.len(), 1);
        assert_eq!(report.decisions_per_decider[0].decided_by, "dr.ortiz");
        assert_eq!(report.decisions_per_decider[0].total, 1);
        assert!(report.mean_decision_hours.is_some());
    }

    #[test]
    fn daily_csv_has_header_and_row() {
        let report = DailyReport {
            date: NaiveDate::from_ymd_opt(2026, 8, 30).expect("date"),
            total: 3,
            rojo: 2,
            verde: 1,
            processed: 1,
            pending: 2,
            mean_score: Some(0.61234),
        };
        let csv = render_daily_csv(&report);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("date,total,rojo,verde,processed,pending,mean_score")
        );
        assert_eq!(lines.next(), Some("2026-08-30,3,2,1,1,2,0.612"));
    }
}

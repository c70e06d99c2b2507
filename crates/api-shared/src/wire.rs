//! Wire DTOs for the REST API.
//!
//! Every type here derives `Serialize`, `Deserialize`, and `ToSchema` so
//! the same definitions drive JSON bodies and the OpenAPI document.
//! Enumerations travel as their wire strings (`ROJO`/`VERDE`,
//! `PENDING`/`ACCEPTED`/`REJECTED`); parsing them into domain enums is the
//! REST layer's job.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health probe response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// One factor's contribution to a classification.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FactorScoreDto {
    /// Raw factor score in [0,1], before weighting.
    pub impact: f64,
    pub description: String,
}

/// Per-factor breakdown returned with every classification.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FactorBreakdownDto {
    pub age: FactorScoreDto,
    pub severity: FactorScoreDto,
    pub specialty: FactorScoreDto,
    pub symptoms: FactorScoreDto,
}

/// A referral submission from a referring clinic.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitReferralReq {
    pub patient_name: String,
    pub patient_document: String,
    pub patient_age: u32,
    pub diagnosis: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub specialty: String,
    /// Clinic-reported severity: `alta`, `media`, or `baja`. Anything else
    /// is treated as not reported.
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A stored referral as returned by the API.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferralDto {
    pub id: String,
    pub code: String,
    pub patient_name: String,
    pub patient_document: String,
    pub patient_age: u32,
    pub diagnosis: String,
    pub symptoms: Vec<String>,
    pub specialty: String,
    pub reason: Option<String>,
    /// `ROJO` or `VERDE`.
    pub priority: String,
    pub score: f64,
    pub confidence: f64,
    pub factors: FactorBreakdownDto,
    /// `PENDING`, `ACCEPTED`, or `REJECTED`.
    pub status: String,
    /// RFC 3339.
    pub created_at: String,
    /// RFC 3339.
    pub deadline: String,
    /// RFC 3339, present once decided.
    pub decided_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitReferralRes {
    pub referral: ReferralDto,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListReferralsRes {
    pub referrals: Vec<ReferralDto>,
}

/// A recorded decision.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionDto {
    pub referral_id: String,
    /// `ACCEPTED` or `REJECTED`.
    pub outcome: String,
    pub justification: String,
    pub decided_by: String,
    pub assigned_specialist: Option<String>,
    /// `YYYY-MM-DD`.
    pub appointment_date: Option<String>,
    /// RFC 3339.
    pub decided_at: String,
}

/// A referral together with its decision, if any.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferralDetailRes {
    pub referral: ReferralDto,
    pub decision: Option<DecisionDto>,
}

/// A physician's decision on a pending referral.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DecideReq {
    /// `ACCEPTED` or `REJECTED`.
    pub outcome: String,
    pub justification: String,
    pub decided_by: String,
    #[serde(default)]
    pub assigned_specialist: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub appointment_date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DecideRes {
    pub decision: DecisionDto,
}

/// Dry-run classification request; nothing is persisted.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassifyReq {
    pub age: u32,
    #[serde(default)]
    pub severity: String,
    pub specialty: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassifyRes {
    /// `ROJO` or `VERDE`.
    pub priority: String,
    pub score: f64,
    pub confidence: f64,
    pub factors: FactorBreakdownDto,
}

/// The currently effective classifier configuration.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassifierConfigRes {
    pub w_age: f64,
    pub w_severity: f64,
    pub w_specialty: f64,
    pub w_symptoms: f64,
    pub red_threshold: f64,
    pub green_threshold: f64,
    /// `stored` when an administrator-saved record is in effect, `default`
    /// when the bootstrap configuration is serving (nothing stored, or the
    /// stored record expired).
    pub source: String,
    pub version: Option<String>,
    /// RFC 3339.
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
}

/// An administrator's replacement classifier configuration.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateConfigReq {
    pub w_age: f64,
    pub w_severity: f64,
    pub w_specialty: f64,
    pub w_symptoms: f64,
    pub red_threshold: f64,
    pub green_threshold: f64,
    pub updated_by: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateConfigRes {
    pub version: String,
    /// RFC 3339.
    pub updated_at: String,
}

/// Daily intake report.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyReportRes {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub total: u64,
    pub rojo: u64,
    pub verde: u64,
    pub processed: u64,
    pub pending: u64,
    pub mean_score: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DayCountDto {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub total: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DeciderCountDto {
    pub decided_by: String,
    pub total: u64,
}

/// Weekly summary report.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WeeklyReportRes {
    /// `YYYY-MM-DD`.
    pub start: String,
    /// `YYYY-MM-DD`.
    pub end: String,
    pub submissions_per_day: Vec<DayCountDto>,
    pub decisions_per_decider: Vec<DeciderCountDto>,
    pub mean_decision_hours: Option<f64>,
}

/// An outbox notification.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    pub id: String,
    pub recipient_role: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    /// `alta` or `media`.
    pub urgency: String,
    pub referral_id: String,
    /// RFC 3339.
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListNotificationsRes {
    pub notifications: Vec<NotificationDto>,
}

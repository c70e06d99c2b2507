//! REST routes and handlers for the triage API.
//!
//! Handlers parse wire DTOs, call into `retria-core` services, and map
//! domain errors onto HTTP status codes:
//!
//! - `InvalidInput` / `Configuration` → 400
//! - `NotFound` → 404
//! - `AlreadyDecided` → 409
//! - anything else → 500, with the detail logged server-side only

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared as wire;
use api_shared::HealthService;
use retria_core::classifier::ClinicalPicture;
use retria_core::{
    classify, ConfigSource, ConfigStore, CoreConfig, DecisionRequest, NotificationService,
    Priority, ReferralFilter, ReferralService, ReferralStatus, ReferralSubmission, ReportService,
    Severity, TriageError,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    referrals: ReferralService,
    config_store: ConfigStore,
    reports: ReportService,
    notifications: NotificationService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let referrals = ReferralService::new(cfg.clone());
        Self {
            config_store: ConfigStore::new(cfg.clone()),
            reports: ReportService::new(referrals.clone()),
            notifications: NotificationService::new(cfg),
            referrals,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        submit_referral,
        list_referrals,
        due_soon,
        get_referral,
        decide_referral,
        evaluate,
        get_classifier_config,
        update_classifier_config,
        daily_report,
        weekly_report,
        list_notifications,
    ),
    components(schemas(
        wire::HealthRes,
        wire::SubmitReferralReq,
        wire::SubmitReferralRes,
        wire::ReferralDto,
        wire::ListReferralsRes,
        wire::ReferralDetailRes,
        wire::DecideReq,
        wire::DecideRes,
        wire::DecisionDto,
        wire::ClassifyReq,
        wire::ClassifyRes,
        wire::FactorBreakdownDto,
        wire::FactorScoreDto,
        wire::ClassifierConfigRes,
        wire::UpdateConfigReq,
        wire::UpdateConfigRes,
        wire::DailyReportRes,
        wire::WeeklyReportRes,
        wire::DayCountDto,
        wire::DeciderCountDto,
        wire::NotificationDto,
        wire::ListNotificationsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the application router. Shared by the standalone REST binary and
/// the workspace's main `retria-run` binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/solicitudes", post(submit_referral))
        .route("/solicitudes", get(list_referrals))
        .route("/solicitudes/vencimientos", get(due_soon))
        .route("/solicitudes/:id", get(get_referral))
        .route("/solicitudes/:id/decision", post(decide_referral))
        .route("/clasificador/evaluar", post(evaluate))
        .route("/clasificador/config", get(get_classifier_config))
        .route("/clasificador/config", put(update_classifier_config))
        .route("/reportes/diario", get(daily_report))
        .route("/reportes/semanal", get(weekly_report))
        .route("/notificaciones", get(list_notifications))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the API until the process exits.
pub async fn serve(cfg: Arc<CoreConfig>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(AppState::new(cfg))).await?;
    Ok(())
}

type HandlerError = (StatusCode, &'static str);

/// Logs the domain error and maps it to an HTTP response.
fn map_error(context: &'static str, e: TriageError) -> HandlerError {
    match &e {
        TriageError::InvalidInput(_) | TriageError::Configuration(_) => {
            tracing::warn!("{context}: {e}");
            (StatusCode::BAD_REQUEST, "Invalid request")
        }
        TriageError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
        TriageError::AlreadyDecided(_) => {
            (StatusCode::CONFLICT, "Referral already decided")
        }
        _ => {
            tracing::error!("{context}: {e:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = wire::HealthRes)
    )
)]
/// Health check endpoint, used by monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<wire::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/solicitudes",
    request_body = wire::SubmitReferralReq,
    responses(
        (status = 201, description = "Referral submitted and classified", body = wire::SubmitReferralRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Submit a referral request.
///
/// The request is classified at intake; the response carries the assigned
/// priority, score, and decision deadline. Physicians are notified through
/// the outbox.
#[axum::debug_handler]
async fn submit_referral(
    State(state): State<AppState>,
    Json(req): Json<wire::SubmitReferralReq>,
) -> Result<(StatusCode, Json<wire::SubmitReferralRes>), HandlerError> {
    let submission = ReferralSubmission {
        patient_name: req.patient_name,
        patient_document: req.patient_document,
        patient_age: req.patient_age,
        diagnosis: req.diagnosis,
        symptoms: req.symptoms,
        specialty: req.specialty,
        severity: Severity::parse(&req.severity),
        reason: req.reason,
    };
    let referral = state
        .referrals
        .submit(submission)
        .map_err(|e| map_error("submit referral", e))?;
    Ok((
        StatusCode::CREATED,
        Json(wire::SubmitReferralRes {
            referral: crate::dto::referral(&referral),
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    estado: Option<String>,
    prioridad: Option<String>,
}

#[utoipa::path(
    get,
    path = "/solicitudes",
    params(
        ("estado" = Option<String>, Query, description = "Filter by status: PENDING, ACCEPTED, REJECTED"),
        ("prioridad" = Option<String>, Query, description = "Filter by priority: ROJO, VERDE"),
    ),
    responses(
        (status = 200, description = "List of referrals, newest first", body = wire::ListReferralsRes),
        (status = 400, description = "Bad request")
    )
)]
/// List referrals, optionally filtered by status and/or priority.
#[axum::debug_handler]
async fn list_referrals(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<wire::ListReferralsRes>, HandlerError> {
    let status = match params.estado.as_deref() {
        None => None,
        Some(s) => Some(
            ReferralStatus::from_wire(s)
                .ok_or((StatusCode::BAD_REQUEST, "Unknown estado value"))?,
        ),
    };
    let priority = match params.prioridad.as_deref() {
        None => None,
        Some(p) => Some(
            Priority::from_wire(p).ok_or((StatusCode::BAD_REQUEST, "Unknown prioridad value"))?,
        ),
    };
    let referrals = state.referrals.list(ReferralFilter { status, priority });
    Ok(Json(wire::ListReferralsRes {
        referrals: referrals.iter().map(crate::dto::referral).collect(),
    }))
}

#[derive(Debug, Deserialize)]
struct DueSoonParams {
    horas: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/solicitudes/vencimientos",
    params(
        ("horas" = Option<i64>, Query, description = "Window in hours (default 2)"),
    ),
    responses(
        (status = 200, description = "Pending referrals due within the window", body = wire::ListReferralsRes),
        (status = 400, description = "Bad request")
    )
)]
/// Pending referrals whose decision deadline is close (or already past),
/// most urgent first.
#[axum::debug_handler]
async fn due_soon(
    State(state): State<AppState>,
    Query(params): Query<DueSoonParams>,
) -> Result<Json<wire::ListReferralsRes>, HandlerError> {
    let hours = params.horas.unwrap_or(2);
    if hours < 0 {
        return Err((StatusCode::BAD_REQUEST, "horas must be non-negative"));
    }
    let referrals = state.referrals.due_soon(hours, Utc::now());
    Ok(Json(wire::ListReferralsRes {
        referrals: referrals.iter().map(crate::dto::referral).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/solicitudes/{id}",
    params(("id" = String, Path, description = "Referral identifier")),
    responses(
        (status = 200, description = "Referral detail", body = wire::ReferralDetailRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Not found")
    )
)]
/// Fetch a referral and its decision, if one has been recorded.
#[axum::debug_handler]
async fn get_referral(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<wire::ReferralDetailRes>, HandlerError> {
    let detail = state
        .referrals
        .get(&id)
        .map_err(|e| map_error("get referral", e))?;
    Ok(Json(wire::ReferralDetailRes {
        referral: crate::dto::referral(&detail.referral),
        decision: detail.decision.as_ref().map(crate::dto::decision),
    }))
}

#[utoipa::path(
    post,
    path = "/solicitudes/{id}/decision",
    params(("id" = String, Path, description = "Referral identifier")),
    request_body = wire::DecideReq,
    responses(
        (status = 201, description = "Decision recorded", body = wire::DecideRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Referral already decided")
    )
)]
/// Record a physician's accept/reject decision.
///
/// The decision is immutable once recorded; a second attempt returns 409.
/// The requesting clinic is notified through the outbox.
#[axum::debug_handler]
async fn decide_referral(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<wire::DecideReq>,
) -> Result<(StatusCode, Json<wire::DecideRes>), HandlerError> {
    let outcome = crate::dto::parse_outcome(&req.outcome)
        .ok_or((StatusCode::BAD_REQUEST, "outcome must be ACCEPTED or REJECTED"))?;
    let appointment_date = match req.appointment_date.as_deref() {
        None => None,
        Some(s) => Some(
            s.parse::<NaiveDate>()
                .map_err(|_| (StatusCode::BAD_REQUEST, "appointment_date must be YYYY-MM-DD"))?,
        ),
    };
    let decision = state
        .referrals
        .decide(
            &id,
            DecisionRequest {
                outcome,
                justification: req.justification,
                decided_by: req.decided_by,
                assigned_specialist: req.assigned_specialist,
                appointment_date,
            },
        )
        .map_err(|e| map_error("decide referral", e))?;
    Ok((
        StatusCode::CREATED,
        Json(wire::DecideRes {
            decision: crate::dto::decision(&decision),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/clasificador/evaluar",
    request_body = wire::ClassifyReq,
    responses(
        (status = 200, description = "Dry-run classification", body = wire::ClassifyRes),
        (status = 400, description = "Bad request")
    )
)]
/// Classify a clinical picture without persisting anything.
///
/// Uses the currently effective classifier configuration. Intended for
/// administrators tuning weights and for clinics previewing a triage
/// outcome.
#[axum::debug_handler]
async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<wire::ClassifyReq>,
) -> Result<Json<wire::ClassifyRes>, HandlerError> {
    let picture = ClinicalPicture {
        age: req.age,
        severity: Severity::parse(&req.severity),
        specialty: req.specialty,
        symptoms: req.symptoms,
    };
    let effective = state.config_store.effective(Utc::now());
    let result =
        classify(&picture, &effective.config).map_err(|e| map_error("evaluate", e))?;
    Ok(Json(wire::ClassifyRes {
        priority: result.priority.as_str().to_string(),
        score: result.score,
        confidence: result.confidence,
        factors: crate::dto::factors(&result.factors),
    }))
}

#[utoipa::path(
    get,
    path = "/clasificador/config",
    responses(
        (status = 200, description = "Currently effective classifier configuration", body = wire::ClassifierConfigRes)
    )
)]
/// The classifier configuration currently in effect, with its provenance.
#[axum::debug_handler]
async fn get_classifier_config(
    State(state): State<AppState>,
) -> Json<wire::ClassifierConfigRes> {
    let effective = state.config_store.effective(Utc::now());
    Json(wire::ClassifierConfigRes {
        w_age: effective.config.w_age,
        w_severity: effective.config.w_severity,
        w_specialty: effective.config.w_specialty,
        w_symptoms: effective.config.w_symptoms,
        red_threshold: effective.config.red_threshold,
        green_threshold: effective.config.green_threshold,
        source: match effective.source {
            ConfigSource::Stored => "stored".into(),
            ConfigSource::Default => "default".into(),
        },
        version: effective.version,
        updated_at: effective.updated_at.map(|t| t.to_rfc3339()),
        updated_by: effective.updated_by,
    })
}

#[utoipa::path(
    put,
    path = "/clasificador/config",
    request_body = wire::UpdateConfigReq,
    responses(
        (status = 200, description = "Configuration saved", body = wire::UpdateConfigRes),
        (status = 400, description = "Invalid configuration")
    )
)]
/// Replace the classifier configuration.
///
/// The candidate is validated before it is persisted; an invalid candidate
/// leaves the stored configuration untouched.
#[axum::debug_handler]
async fn update_classifier_config(
    State(state): State<AppState>,
    Json(req): Json<wire::UpdateConfigReq>,
) -> Result<Json<wire::UpdateConfigRes>, HandlerError> {
    let candidate = retria_core::ClassifierConfig {
        w_age: req.w_age,
        w_severity: req.w_severity,
        w_specialty: req.w_specialty,
        w_symptoms: req.w_symptoms,
        red_threshold: req.red_threshold,
        green_threshold: req.green_threshold,
    };
    let stored = state
        .config_store
        .update(candidate, &req.updated_by, Utc::now())
        .map_err(|e| map_error("update classifier config", e))?;
    Ok(Json(wire::UpdateConfigRes {
        version: stored.version,
        updated_at: stored.updated_at.to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
struct DailyParams {
    fecha: Option<String>,
    formato: Option<String>,
}

#[utoipa::path(
    get,
    path = "/reportes/diario",
    params(
        ("fecha" = Option<String>, Query, description = "Report date, YYYY-MM-DD (default today)"),
        ("formato" = Option<String>, Query, description = "Set to csv for CSV output"),
    ),
    responses(
        (status = 200, description = "Daily intake report", body = wire::DailyReportRes),
        (status = 400, description = "Bad request")
    )
)]
/// Daily intake report, as JSON or CSV.
#[axum::debug_handler]
async fn daily_report(
    State(state): State<AppState>,
    Query(params): Query<DailyParams>,
) -> Result<Response, HandlerError> {
    let date = match params.fecha.as_deref() {
        None => Utc::now().date_naive(),
        Some(s) => s
            .parse::<NaiveDate>()
            .map_err(|_| (StatusCode::BAD_REQUEST, "fecha must be YYYY-MM-DD"))?,
    };
    let report = state.reports.daily(date);
    if params.formato.as_deref() == Some("csv") {
        let body = retria_core::reporting::render_daily_csv(&report);
        return Ok(([(header::CONTENT_TYPE, "text/csv")], body).into_response());
    }
    Ok(Json(crate::dto::daily_report(&report)).into_response())
}

#[derive(Debug, Deserialize)]
struct WeeklyParams {
    inicio: Option<String>,
}

#[utoipa::path(
    get,
    path = "/reportes/semanal",
    params(
        ("inicio" = Option<String>, Query, description = "Week start, YYYY-MM-DD (default six days ago)"),
    ),
    responses(
        (status = 200, description = "Weekly summary report", body = wire::WeeklyReportRes),
        (status = 400, description = "Bad request")
    )
)]
/// Seven-day summary: submissions per day and decisions per physician.
#[axum::debug_handler]
async fn weekly_report(
    State(state): State<AppState>,
    Query(params): Query<WeeklyParams>,
) -> Result<Json<wire::WeeklyReportRes>, HandlerError> {
    let start = match params.inicio.as_deref() {
        None => Utc::now().date_naive() - chrono::Duration::days(6),
        Some(s) => s
            .parse::<NaiveDate>()
            .map_err(|_| (StatusCode::BAD_REQUEST, "inicio must be YYYY-MM-DD"))?,
    };
    let report = state.reports.weekly(start);
    Ok(Json(crate::dto::weekly_report(&report)))
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    rol: Option<String>,
}

#[utoipa::path(
    get,
    path = "/notificaciones",
    params(
        ("rol" = Option<String>, Query, description = "Filter by recipient role: medico, ips"),
    ),
    responses(
        (status = 200, description = "Outbox notifications, newest first", body = wire::ListNotificationsRes)
    )
)]
/// List outbox notifications, optionally filtered by recipient role.
#[axum::debug_handler]
async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<NotificationParams>,
) -> Json<wire::ListNotificationsRes> {
    let notifications = state.notifications.list(params.rol.as_deref());
    Json(wire::ListNotificationsRes {
        notifications: notifications.iter().map(crate::dto::notification).collect(),
    })
}

use crate::assessment::{assess, RiskAssessment};
use crate::auth::{bearer_token, IdentityVerifier};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CallerIdentity, ReportQuery, ReportResponse};
use crate::provider::InfoExpertoClient;
use crate::report::ExternalReport;
use crate::report_cache::ReportCache;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the InfoExperto report API.
    pub provider: InfoExpertoClient,
    /// Token verifier; `None` when authentication is disabled.
    pub verifier: Option<IdentityVerifier>,
    /// Memo of raw provider reports.
    pub report_cache: ReportCache,
}

/// Report endpoints. Callers add rate limiting and the health route on top.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/reports", post(fetch_and_assess))
        // Path used by the first version of the web client
        .route("/api/infoexperto", post(fetch_and_assess))
        .route("/api/v1/assessments", post(assess_document))
}

/// Health check endpoint.
///
/// Returns the service status and version along with the active auth and cache settings.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "credit-risk-api",
            "version": env!("CARGO_PKG_VERSION"),
            "authRequired": !state.config.auth_disabled,
            "reportCacheTtlSecs": state.config.report_cache_ttl_secs
        })),
    )
}

/// Verifies the caller's bearer token unless authentication is disabled.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<CallerIdentity, AppError> {
    let Some(ref verifier) = state.verifier else {
        return Ok(CallerIdentity::anonymous());
    };

    let token = bearer_token(headers)?;
    verifier.verify(token).await
}

/// POST /api/v1/reports
///
/// Fetches the provider report for a document and returns the risk assessment.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `headers` - Request headers carrying the bearer token.
/// * `query` - JSON body with `tipoDocumento`, `numero` and optional `sexo`.
///
/// # Returns
///
/// * `Result<Json<ReportResponse>, AppError>` - Name, tier and, for the `MEDIO` tier, the decision.
pub async fn fetch_and_assess(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(query): Json<ReportQuery>,
) -> Result<Json<ReportResponse>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    let request = query.validate()?;
    tracing::info!(
        "POST /reports - caller: {}, document: {} {}",
        caller.uid,
        request.document_type.as_str(),
        request.masked_number()
    );

    let cache_key = request.cache_key();
    let report = match state.report_cache.get(&cache_key).await {
        Some(report) => report,
        None => {
            let report = state.provider.fetch_report(&request).await?;
            state.report_cache.insert(cache_key, &report).await;
            report
        }
    };

    let assessment = assess(&report);
    log_assessment(&request.masked_number(), &assessment);

    Ok(Json(ReportResponse::new(&request, assessment)))
}

/// POST /api/v1/assessments
///
/// Evaluates a report document supplied by the caller, without contacting the
/// provider. Accepts either the bare report or the provider envelope.
pub async fn assess_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<RiskAssessment>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    tracing::info!("POST /assessments - caller: {}", caller.uid);

    let report = ExternalReport::from_payload(payload).ok_or_else(|| {
        AppError::BadRequest("El cuerpo debe ser un informe (objeto JSON)".to_string())
    })?;

    let assessment = assess(&report);
    log_assessment("inline", &assessment);

    Ok(Json(assessment))
}

fn log_assessment(subject: &str, assessment: &RiskAssessment) {
    match assessment.decision {
        Some(ref decision) => tracing::info!(
            "Assessment for {}: tier {}, score {}, status {}",
            subject,
            assessment.coarse_tier,
            decision.score,
            decision.status.as_str()
        ),
        None => tracing::info!(
            "Assessment for {}: tier {}, no internal decision",
            subject,
            assessment.coarse_tier
        ),
    }
}

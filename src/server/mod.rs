//! HTTP forwarding endpoints
//!
//! Thin pass-throughs for front ends that cannot hold the API key
//! themselves: one triggers a full retrieval, the other validates and
//! forwards a cohort submission.
//!
//! Submission results are relayed verbatim. Patient records are returned
//! as parsed, so identifiers are always strings and readable vitals are
//! always numbers, whatever form the upstream used.

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::client::TriageClient;
use crate::cohort::CohortSubmission;
use crate::patient::Patient;
use crate::progress::ProgressReporter;

const COHORT_FIELDS: [&str; 3] = ["high_risk_patients", "fever_patients", "data_quality_issues"];

/// Forwarding server
pub struct TriageServer {
    client: TriageClient,
    port: u16,
}

struct ApiState {
    client: TriageClient,
}

/// Records are the normalized [`Patient`] form, not the upstream bytes:
/// ids become strings and numeric vitals become JSON floats.
#[derive(Serialize)]
struct PatientsResponse {
    patients: Vec<Patient>,
    count: usize,
}

impl TriageServer {
    pub fn new(client: TriageClient, port: u16) -> Self {
        Self { client, port }
    }

    /// Bind and serve until the process exits.
    pub async fn start(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let app = router(self.client);

        info!("Starting triage forwarding server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Build the router; exposed so it can be served on any listener.
pub fn router(client: TriageClient) -> Router {
    let shared_state = Arc::new(ApiState { client });

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/patients", get(fetch_patients))
        .route("/api/submit-assessment", post(submit_assessment))
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn fetch_patients(State(state): State<Arc<ApiState>>) -> Response {
    let progress = ProgressReporter::silent();

    match state.client.fetch_all_patients(&progress).await {
        Ok(patients) => {
            let count = patients.len();
            Json(PatientsResponse { patients, count }).into_response()
        }
        Err(e) => {
            error!("Patient retrieval failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn submit_assessment(State(state): State<Arc<ApiState>>, body: Bytes) -> Response {
    let cohorts = match parse_body(&body) {
        Ok(cohorts) => cohorts,
        Err(message) => {
            warn!("Rejected submission: {}", message);
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    let progress = ProgressReporter::silent();
    match state.client.submit(&cohorts, &progress).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!("Submission forwarding failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Any content type is accepted; the body only has to be a JSON object.
fn parse_body(body: &[u8]) -> std::result::Result<CohortSubmission, String> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| format!("Request body must be a JSON object: {e}"))?;
    if !value.is_object() {
        return Err("Request body must be a JSON object".to_string());
    }
    parse_cohorts(&value)
}

/// All three cohort lists must be present and hold only strings.
fn parse_cohorts(body: &Value) -> std::result::Result<CohortSubmission, String> {
    let missing: Vec<&str> = COHORT_FIELDS
        .iter()
        .copied()
        .filter(|field| !body.get(*field).is_some_and(Value::is_array))
        .collect();

    if !missing.is_empty() {
        return Err(format!(
            "Missing or invalid cohort lists: {}",
            missing.join(", ")
        ));
    }

    serde_json::from_value(body.clone())
        .map_err(|e| format!("Cohort lists must contain patient identifiers: {e}"))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cohorts_requires_all_lists() {
        let err = parse_cohorts(&json!({
            "high_risk_patients": ["A"],
            "fever_patients": []
        }))
        .unwrap_err();
        assert!(err.contains("data_quality_issues"));
        assert!(!err.contains("fever_patients"));
    }

    #[test]
    fn test_parse_cohorts_rejects_non_arrays() {
        let err = parse_cohorts(&json!({
            "high_risk_patients": "A",
            "fever_patients": [],
            "data_quality_issues": []
        }))
        .unwrap_err();
        assert!(err.contains("high_risk_patients"));

        let err = parse_cohorts(&json!({
            "high_risk_patients": [1, 2],
            "fever_patients": [],
            "data_quality_issues": []
        }))
        .unwrap_err();
        assert!(err.contains("identifiers"));
    }

    #[test]
    fn test_parse_body_rejects_non_json() {
        let err = parse_body(b"").unwrap_err();
        assert!(err.contains("JSON object"));

        let err = parse_body(b"high_risk_patients=A").unwrap_err();
        assert!(err.contains("JSON object"));

        let err = parse_body(b"[1, 2]").unwrap_err();
        assert!(err.contains("JSON object"));
    }

    #[test]
    fn test_parse_body_accepts_raw_bytes() {
        let body =
            br#"{"high_risk_patients":["A"],"fever_patients":[],"data_quality_issues":["A"]}"#;
        let cohorts = parse_body(body).unwrap();
        assert_eq!(cohorts.high_risk, ["A"]);
        assert_eq!(cohorts.data_quality, ["A"]);
    }

    #[test]
    fn test_parse_cohorts_accepts_valid_body() {
        let cohorts = parse_cohorts(&json!({
            "high_risk_patients": ["A", "B"],
            "fever_patients": ["B"],
            "data_quality_issues": []
        }))
        .unwrap();
        assert_eq!(cohorts.high_risk, ["A", "B"]);
        assert_eq!(cohorts.fever, ["B"]);
        assert!(cohorts.data_quality.is_empty());
    }
}

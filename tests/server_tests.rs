//! Forwarding endpoints served in front of a scripted upstream

mod common;

use common::{page, patient, Upstream};
use patient_triage::server::router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve the forwarding router on an ephemeral port.
async fn serve(upstream: &Upstream) -> String {
    let app = router(upstream.client());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health_check() {
    let upstream = Upstream::start().await;
    let base = serve(&upstream).await;

    let response = reqwest::get(format!("{base}/api/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_patients_endpoint_returns_all_pages() {
    let upstream = Upstream::start().await;
    upstream
        .push_page(200, page(vec![patient("DEMO001", "120/80", json!(98.6), json!(45))], 1, 2))
        .push_page(200, page(vec![patient("DEMO002", "140/90", json!(99.9), json!(70))], 2, 2));
    let base = serve(&upstream).await;

    let response = reqwest::get(format!("{base}/api/patients")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["patients"][1]["patient_id"], "DEMO002");
}

#[tokio::test]
async fn test_patients_endpoint_reports_upstream_failure() {
    let upstream = Upstream::start().await;
    upstream.push_page(401, json!({ "error": "Invalid API key" }));
    let base = serve(&upstream).await;

    let response = reqwest::get(format!("{base}/api/patients")).await.unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_submit_rejects_incomplete_body_without_forwarding() {
    let upstream = Upstream::start().await;
    let base = serve(&upstream).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/submit-assessment"))
        .json(&json!({ "high_risk_patients": ["DEMO001"], "fever_patients": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("data_quality_issues"));
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_submit_forwards_and_returns_result() {
    let upstream = Upstream::start().await;
    upstream.push_submission(200, patient_triage::testing::submission_body());
    let base = serve(&upstream).await;

    let cohorts = json!({
        "high_risk_patients": ["DEMO001"],
        "fever_patients": ["DEMO002"],
        "data_quality_issues": []
    });
    let response = reqwest::Client::new()
        .post(format!("{base}/api/submit-assessment"))
        .json(&cohorts)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "PASS");
    assert_eq!(body["breakdown"]["high_risk"]["score"], 48);

    let forwarded = upstream.requests_to("/submit-assessment");
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].body, Some(cohorts));
}

#[tokio::test]
async fn test_submit_reports_upstream_rejection() {
    let upstream = Upstream::start().await;
    upstream.push_submission(422, json!({ "error": "Unprocessable" }));
    let base = serve(&upstream).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/submit-assessment"))
        .json(&json!({
            "high_risk_patients": [],
            "fever_patients": [],
            "data_quality_issues": []
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn test_submit_without_json_content_type_gets_json_error() {
    let upstream = Upstream::start().await;
    let base = serve(&upstream).await;
    let client = reqwest::Client::new();

    let empty = client
        .post(format!("{base}/api/submit-assessment"))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);
    let body: Value = empty.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("JSON object"));

    let text = client
        .post(format!("{base}/api/submit-assessment"))
        .header("content-type", "text/plain")
        .body("high_risk_patients=DEMO001")
        .send()
        .await
        .unwrap();
    assert_eq!(text.status(), 400);
    let body: Value = text.json().await.unwrap();
    assert!(body["error"].is_string());

    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_submit_accepts_valid_body_without_content_type() {
    let upstream = Upstream::start().await;
    upstream.push_submission(200, json!({ "score": 70, "status": "PASS" }));
    let base = serve(&upstream).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/submit-assessment"))
        .body(r#"{"high_risk_patients":[],"fever_patients":["DEMO002"],"data_quality_issues":[]}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "score": 70, "status": "PASS" }));
}

#[tokio::test]
async fn test_patients_endpoint_returns_normalized_records() {
    let upstream = Upstream::start().await;
    upstream.push_page(
        200,
        page(
            vec![json!({ "patient_id": 42, "age": "45", "temperature": 98, "blood_pressure": "120/80" })],
            1,
            1,
        ),
    );
    let base = serve(&upstream).await;

    let body: Value = reqwest::get(format!("{base}/api/patients"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let record = &body["patients"][0];
    assert_eq!(record["patient_id"], "42");
    assert!(record["age"].is_f64());
    assert_eq!(record["age"], 45.0);
    assert_eq!(record["temperature"], 98.0);
    assert_eq!(record["blood_pressure"], "120/80");
}

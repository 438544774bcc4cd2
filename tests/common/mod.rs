//! Common test utilities and helpers
//!
//! [`Upstream`] is a scripted stand-in for the remote patient service,
//! served on an ephemeral local port. Each endpoint replays queued
//! responses in order and records every request it receives.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use patient_triage::client::{RetryPolicy, TriageClient, API_KEY_HEADER};
use patient_triage::config::TriageConfig;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TEST_API_KEY: &str = "ak_integration";

/// A request observed by the upstream
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub api_key: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct UpstreamState {
    pages: Mutex<VecDeque<(StatusCode, Value)>>,
    submissions: Mutex<VecDeque<(StatusCode, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Scripted patient service
pub struct Upstream {
    base_url: String,
    state: Arc<UpstreamState>,
    handle: JoinHandle<()>,
}

impl Upstream {
    pub async fn start() -> Self {
        let state = Arc::new(UpstreamState::default());
        let app = Router::new()
            .route("/patients", get(patients))
            .route("/submit-assessment", post(submit))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queue the next `/patients` response
    pub fn push_page(&self, status: u16, body: Value) -> &Self {
        self.state
            .pages
            .lock()
            .unwrap()
            .push_back((StatusCode::from_u16(status).unwrap(), body));
        self
    }

    /// Queue the next `/submit-assessment` response
    pub fn push_submission(&self, status: u16, body: Value) -> &Self {
        self.state
            .submissions
            .lock()
            .unwrap()
            .push_back((StatusCode::from_u16(status).unwrap(), body));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Configuration pointing at this upstream, with fast retries
    pub fn config(&self) -> TriageConfig {
        TriageConfig {
            api_key: Some(TEST_API_KEY.to_string()),
            base_url: Some(self.base_url.clone()),
            inter_page_delay: Duration::from_millis(5),
            retry: RetryPolicy {
                base_delay: Duration::from_millis(10),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn client(&self) -> TriageClient {
        TriageClient::from_config(self.config()).unwrap()
    }
}

impl Drop for Upstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn patients(
    State(state): State<Arc<UpstreamState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: "/patients".to_string(),
        page: params.get("page").and_then(|p| p.parse().ok()),
        limit: params.get("limit").and_then(|l| l.parse().ok()),
        api_key: api_key(&headers),
        body: None,
    });

    let next = state.pages.lock().unwrap().pop_front();
    scripted(next)
}

async fn submit(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: "/submit-assessment".to_string(),
        page: None,
        limit: None,
        api_key: api_key(&headers),
        body: Some(body),
    });

    let next = state.submissions.lock().unwrap().pop_front();
    scripted(next)
}

fn api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn scripted(next: Option<(StatusCode, Value)>) -> Response {
    match next {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no scripted response" })),
        )
            .into_response(),
    }
}

/// Page envelope with the given raw records
pub fn page(records: Vec<Value>, page: u32, total_pages: u32) -> Value {
    let count = records.len();
    json!({
        "data": records,
        "pagination": {
            "page": page,
            "limit": 5,
            "total": count,
            "totalPages": total_pages,
            "hasNext": page < total_pages,
            "hasPrevious": page > 1
        }
    })
}

pub fn patient(id: &str, blood_pressure: &str, temperature: Value, age: Value) -> Value {
    json!({
        "patient_id": id,
        "name": format!("Patient {id}"),
        "blood_pressure": blood_pressure,
        "temperature": temperature,
        "age": age
    })
}

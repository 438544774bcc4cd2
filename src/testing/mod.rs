//! Testing utilities and doubles
//!
//! [`MockPatientApi`] replays scripted responses in order and records what
//! was asked of it, so retrieval and submission logic can be exercised
//! without a network.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::PatientApi;
use crate::cohort::CohortSubmission;
use crate::error::{Error, Result};

/// Scripted [`PatientApi`] double
#[derive(Clone, Default)]
pub struct MockPatientApi {
    page_responses: Arc<Mutex<VecDeque<Result<Value>>>>,
    submit_responses: Arc<Mutex<VecDeque<Result<Value>>>>,
    requested_pages: Arc<Mutex<Vec<u32>>>,
    submissions: Arc<Mutex<Vec<CohortSubmission>>>,
}

impl MockPatientApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next page response
    pub async fn add_page(&self, body: Value) {
        self.page_responses.lock().await.push_back(Ok(body));
    }

    /// Queue a failure for the next page request
    pub async fn add_error(&self, error: Error) {
        self.page_responses.lock().await.push_back(Err(error));
    }

    /// Queue the next submission response
    pub async fn add_submit_response(&self, response: Result<Value>) {
        self.submit_responses.lock().await.push_back(response);
    }

    /// Pages requested so far, including retries
    pub async fn requested_pages(&self) -> Vec<u32> {
        self.requested_pages.lock().await.clone()
    }

    pub async fn submissions(&self) -> Vec<CohortSubmission> {
        self.submissions.lock().await.clone()
    }
}

#[async_trait]
impl PatientApi for MockPatientApi {
    async fn fetch_page(&self, page: u32, _limit: u32) -> Result<Value> {
        self.requested_pages.lock().await.push(page);
        self.page_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(Error::Validation(format!("no scripted response for page {page}"))))
    }

    async fn submit_assessment(&self, cohorts: &CohortSubmission) -> Result<Value> {
        self.submissions.lock().await.push(cohorts.clone());
        self.submit_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(Error::Validation("no scripted submission response".into())))
    }
}

/// Well-formed page envelope with bare patient records.
pub fn page_body(ids: &[&str], page: u32, total_pages: u32) -> Value {
    let data: Vec<Value> = ids.iter().map(|id| json!({ "patient_id": id })).collect();
    let count = data.len();
    json!({
        "data": data,
        "pagination": {
            "page": page,
            "limit": count,
            "total": count,
            "totalPages": total_pages,
            "hasNext": page < total_pages,
            "hasPrevious": page > 1
        },
        "metadata": { "timestamp": "2025-01-01T00:00:00Z", "version": "v1.0" }
    })
}

/// Submission response in the shape the scoring service returns.
pub fn submission_body() -> Value {
    json!({
        "success": true,
        "message": "Assessment submitted successfully",
        "results": {
            "score": 91.5,
            "percentage": 92,
            "status": "PASS",
            "breakdown": {
                "high_risk": { "score": 48, "max": 50, "correct": 20, "submitted": 21, "matches": 20 },
                "fever": { "score": 19, "max": 25, "correct": 7, "submitted": 9, "matches": 7 },
                "data_quality": { "score": 25, "max": 25, "correct": 8, "submitted": 8, "matches": 8 }
            },
            "feedback": {
                "strengths": ["Perfect data quality detection"],
                "issues": ["Fever: 2 false positives"]
            },
            "attempt_number": 1,
            "remaining_attempts": 2,
            "is_personal_best": true,
            "can_resubmit": true
        }
    })
}

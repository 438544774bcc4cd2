//! Single-attempt access to the remote patient service
//!
//! Nothing here retries. [`PatientApi`] is the seam the retriever and
//! submitter are written against, so tests can swap in a scripted double.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::cohort::CohortSubmission;
use crate::config::TriageConfig;
use crate::error::{Error, Result};

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-api-key";

/// One request per call against the patient service
#[async_trait]
pub trait PatientApi: Send + Sync {
    /// `GET /patients?page=P&limit=L`, returning the raw envelope.
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Value>;

    /// `POST /submit-assessment`, returning the raw response body.
    async fn submit_assessment(&self, cohorts: &CohortSubmission) -> Result<Value>;
}

/// reqwest-backed implementation
pub struct HttpPatientApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpPatientApi {
    /// Build a client from validated configuration.
    ///
    /// Fails with [`Error::Config`] before any network activity when the API
    /// key or base URL is missing.
    pub fn new(config: &TriageConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url()?.to_string(),
            api_key: config.api_key()?.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl PatientApi for HttpPatientApi {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Value> {
        let url = self.endpoint("patients");
        debug!("GET {} page={} limit={}", url, page, limit);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        read_json(response).await
    }

    async fn submit_assessment(&self, cohorts: &CohortSubmission) -> Result<Value> {
        let url = self.endpoint("submit-assessment");
        debug!(
            "POST {} ({} high risk, {} fever, {} data quality)",
            url,
            cohorts.high_risk.len(),
            cohorts.fever.len(),
            cohorts.data_quality.len()
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(cohorts)
            .send()
            .await?;

        read_json(response).await
    }
}

/// Map a response to JSON, or to an error that keeps status and body.
async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        Error::InvalidResponse(format!(
            "expected JSON body ({e}): {}",
            truncate(&body, 200)
        ))
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

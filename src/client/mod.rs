//! Resilient client for the remote patient service
//!
//! - `api` - single-attempt HTTP calls behind the [`PatientApi`] trait
//! - `retry` - backoff policy and retry executor shared by every call
//! - `pagination` - sequential page retrieval with defensive envelope parsing
//! - `submit` - cohort submission

pub mod api;
pub mod pagination;
pub mod retry;
pub mod submit;

pub use api::{HttpPatientApi, PatientApi, API_KEY_HEADER};
pub use pagination::{PageEnvelope, PaginatedRetriever, Pagination, RetrievalOptions};
pub use retry::{AttemptState, RetryExecutor, RetryMetrics, RetryNotice, RetryPolicy};
pub use submit::{CohortBreakdown, SubmissionResult, Submitter};

use std::sync::Arc;

use crate::cohort::CohortSubmission;
use crate::config::TriageConfig;
use crate::error::Result;
use crate::patient::Patient;
use crate::progress::ProgressReporter;

/// Shared handle bundling an API implementation with its configuration
#[derive(Clone)]
pub struct TriageClient {
    api: Arc<dyn PatientApi>,
    config: TriageConfig,
}

impl TriageClient {
    /// Validate configuration and build an HTTP-backed client.
    pub fn from_config(config: TriageConfig) -> Result<Self> {
        let api = HttpPatientApi::new(&config)?;
        Ok(Self {
            api: Arc::new(api),
            config,
        })
    }

    /// Use a custom API implementation, e.g. a test double.
    pub fn with_api(api: Arc<dyn PatientApi>, config: TriageConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    pub fn api(&self) -> &dyn PatientApi {
        self.api.as_ref()
    }

    pub async fn fetch_all_patients(&self, progress: &ProgressReporter) -> Result<Vec<Patient>> {
        PaginatedRetriever::new(self.api(), RetrievalOptions::from(&self.config), progress)
            .fetch_all()
            .await
    }

    pub async fn submit(
        &self,
        cohorts: &CohortSubmission,
        progress: &ProgressReporter,
    ) -> Result<SubmissionResult> {
        Submitter::new(self.api(), self.config.retry.clone(), progress)
            .submit(cohorts)
            .await
    }
}

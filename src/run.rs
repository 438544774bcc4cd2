//! End-to-end assessment run: retrieve, assess, categorize, optionally submit

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{SubmissionResult, TriageClient};
use crate::cohort::{categorize, summarize, CohortSubmission, CohortSummary};
use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::scoring::{assess_all, AssessedRecord};

/// Everything a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    pub patients: Vec<AssessedRecord>,
    pub cohorts: CohortSubmission,
    pub summary: CohortSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionResult>,
}

/// Run the whole pipeline once. Each call owns its own accumulator.
pub async fn run_assessment(
    client: &TriageClient,
    submit: bool,
    progress: &ProgressReporter,
) -> Result<AssessmentReport> {
    let patients = client.fetch_all_patients(progress).await?;

    let assessed = assess_all(&patients);
    let cohorts = categorize(&assessed);
    let summary = summarize(&assessed);
    info!(
        "Assessed {} patients: {} high risk, {} fever, {} data quality",
        summary.total_patients, summary.high_risk, summary.fever, summary.data_quality
    );

    let submission = if submit {
        Some(client.submit(&cohorts, progress).await?)
    } else {
        None
    };

    Ok(AssessmentReport {
        patients: assessed,
        cohorts,
        summary,
        submission,
    })
}

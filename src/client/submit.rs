//! Cohort submission

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::{debug, error, info};

use super::api::PatientApi;
use super::retry::{RetryExecutor, RetryPolicy};
use crate::cohort::CohortSubmission;
use crate::error::{Error, Result};
use crate::progress::ProgressReporter;

/// Scoring service verdict, kept exactly as received.
///
/// The object is stored untouched and serializes back to the same JSON,
/// nulls and unexpected types included. Accessors read typed views and
/// return `None` when a key is absent or holds something else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionResult {
    raw: Map<String, Value>,
}

/// Read-only view of one cohort's entry in the breakdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortBreakdown<'a> {
    raw: &'a Map<String, Value>,
}

impl<'a> CohortBreakdown<'a> {
    pub fn score(&self) -> Option<&'a Number> {
        number(self.raw, "score")
    }

    pub fn max(&self) -> Option<&'a Number> {
        number(self.raw, "max")
    }

    pub fn matches(&self) -> Option<&'a Number> {
        number(self.raw, "matches")
    }

    pub fn submitted(&self) -> Option<&'a Number> {
        number(self.raw, "submitted")
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.raw.get(key)
    }
}

fn number<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Number> {
    match raw.get(key) {
        Some(Value::Number(n)) => Some(n),
        _ => None,
    }
}

impl SubmissionResult {
    /// Read a response body, unwrapping a `{success, message, results}` wrapper.
    ///
    /// Any JSON object is accepted; only a non-object body is rejected.
    pub fn from_response(body: Value) -> Result<Self> {
        match body {
            Value::Object(mut outer) if outer.get("results").is_some_and(Value::is_object) => {
                if let Some(message) = outer.get("message").and_then(Value::as_str) {
                    debug!("Submission response message: {}", message);
                }
                match outer.remove("results") {
                    Some(Value::Object(raw)) => Ok(Self { raw }),
                    _ => Err(Error::InvalidResponse(
                        "submission results vanished while unwrapping".into(),
                    )),
                }
            }
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(Error::InvalidResponse(format!(
                "expected a JSON object from submission, got {other}"
            ))),
        }
    }

    /// Raw value of any top-level key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn score(&self) -> Option<&Number> {
        number(&self.raw, "score")
    }

    pub fn percentage(&self) -> Option<&Number> {
        number(&self.raw, "percentage")
    }

    pub fn status(&self) -> Option<&str> {
        self.raw.get("status").and_then(Value::as_str)
    }

    pub fn attempt_number(&self) -> Option<&Number> {
        number(&self.raw, "attempt_number")
    }

    pub fn remaining_attempts(&self) -> Option<&Number> {
        number(&self.raw, "remaining_attempts")
    }

    pub fn feedback(&self) -> Option<&Value> {
        self.raw.get("feedback").filter(|v| !v.is_null())
    }

    /// Per-cohort entries of `breakdown` that are objects, in key order.
    pub fn breakdown(&self) -> impl Iterator<Item = (&str, CohortBreakdown<'_>)> {
        self.raw
            .get("breakdown")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter_map(|(name, entry)| {
                entry
                    .as_object()
                    .map(|raw| (name.as_str(), CohortBreakdown { raw }))
            })
    }

    pub fn cohort(&self, name: &str) -> Option<CohortBreakdown<'_>> {
        self.raw
            .get("breakdown")?
            .get(name)?
            .as_object()
            .map(|raw| CohortBreakdown { raw })
    }

    pub fn passed(&self) -> Option<bool> {
        self.status().map(|s| s.eq_ignore_ascii_case("pass"))
    }
}

/// Posts cohorts under the shared retry policy
pub struct Submitter<'a> {
    api: &'a dyn PatientApi,
    executor: RetryExecutor,
    progress: &'a ProgressReporter,
}

impl<'a> Submitter<'a> {
    pub fn new(api: &'a dyn PatientApi, retry: RetryPolicy, progress: &'a ProgressReporter) -> Self {
        Self {
            api,
            executor: RetryExecutor::new(retry),
            progress,
        }
    }

    pub async fn submit(&self, cohorts: &CohortSubmission) -> Result<SubmissionResult> {
        let submitted = cohorts.high_risk.len() + cohorts.fever.len() + cohorts.data_quality.len();
        self.progress
            .info(0, None, submitted, "Submitting assessment...");

        let outcome = self
            .executor
            .execute_with_retry(
                "Submitting assessment",
                || self.api.submit_assessment(cohorts),
                |notice| {
                    self.progress.info(
                        0,
                        None,
                        submitted,
                        format!(
                            "Submission attempt {}/{} failed, retrying in {}ms",
                            notice.failed_attempt,
                            notice.max_attempts,
                            notice.delay.as_millis()
                        ),
                    );
                },
            )
            .await
            .and_then(SubmissionResult::from_response);

        match outcome {
            Ok(result) => {
                info!(
                    "Assessment submitted (status: {})",
                    result.status().unwrap_or("unknown")
                );
                self.progress
                    .success(0, None, submitted, "Assessment submitted");
                Ok(result)
            }
            Err(e) => {
                error!("Submission failed: {}", e);
                self.progress
                    .error(0, None, submitted, format!("Submission failed: {e}"));
                Err(e)
            }
        }
    }
}

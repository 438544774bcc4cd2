//! Sequential paginated retrieval
//!
//! Page 1 establishes the page count; the remaining pages are fetched one at
//! a time with a fixed courtesy delay between them. Envelopes are read
//! defensively: a page without a usable `data` array contributes nothing but
//! never ends the run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

use super::api::PatientApi;
use super::retry::{RetryExecutor, RetryMetrics, RetryPolicy};
use crate::config::TriageConfig;
use crate::error::Result;
use crate::patient::Patient;
use crate::progress::ProgressReporter;

/// Pagination block of a page envelope. Every field is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
    pub has_next: Option<bool>,
    pub has_previous: Option<bool>,
}

impl Pagination {
    /// Read whatever is usable; camelCase and snake_case keys are both accepted.
    pub fn from_json(value: Option<&Value>) -> Self {
        let Some(obj) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        let field = |camel: &str, snake: &str| obj.get(camel).or_else(|| obj.get(snake));

        Self {
            page: field("page", "page").and_then(json_u64).and_then(to_u32),
            limit: field("limit", "limit").and_then(json_u64).and_then(to_u32),
            total: field("total", "total").and_then(json_u64),
            total_pages: field("totalPages", "total_pages")
                .and_then(json_u64)
                .and_then(to_u32),
            has_next: field("hasNext", "has_next").and_then(Value::as_bool),
            has_previous: field("hasPrevious", "has_previous").and_then(Value::as_bool),
        }
    }

    /// Page count to drive the loop with; always at least 1.
    ///
    /// Falls back to `ceil(total / limit)` when `totalPages` is missing.
    pub fn resolved_total_pages(&self) -> u32 {
        if let Some(pages) = self.total_pages.filter(|p| *p > 0) {
            return pages;
        }

        match (self.total, self.limit) {
            (Some(total), Some(limit)) if limit > 0 => {
                to_u32(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX).max(1)
            }
            _ => 1,
        }
    }
}

fn json_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_u32(value: u64) -> Option<u32> {
    u32::try_from(value).ok()
}

/// One page as understood by the retriever
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope {
    pub patients: Vec<Patient>,
    pub pagination: Pagination,
    pub metadata: Option<Value>,
    /// `data` was absent or not an array
    pub data_malformed: bool,
    /// Array entries that could not be read as patients
    pub dropped_records: usize,
}

impl PageEnvelope {
    pub fn from_json(value: &Value) -> Self {
        let pagination = Pagination::from_json(value.get("pagination"));
        let metadata = value.get("metadata").cloned();

        let Some(items) = value.get("data").and_then(Value::as_array) else {
            return Self {
                patients: Vec::new(),
                pagination,
                metadata,
                data_malformed: true,
                dropped_records: 0,
            };
        };

        let mut patients = Vec::with_capacity(items.len());
        let mut dropped_records = 0;
        for item in items {
            match serde_json::from_value::<Patient>(item.clone()) {
                Ok(patient) => patients.push(patient),
                Err(e) => {
                    warn!("Dropping unreadable patient record: {}", e);
                    dropped_records += 1;
                }
            }
        }

        Self {
            patients,
            pagination,
            metadata,
            data_malformed: false,
            dropped_records,
        }
    }
}

/// Knobs for a retrieval session
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    pub page_limit: u32,
    pub inter_page_delay: Duration,
    pub retry: RetryPolicy,
}

impl From<&TriageConfig> for RetrievalOptions {
    fn from(config: &TriageConfig) -> Self {
        Self {
            page_limit: config.page_limit,
            inter_page_delay: config.inter_page_delay,
            retry: config.retry.clone(),
        }
    }
}

/// Drives one fetch session over every page
pub struct PaginatedRetriever<'a> {
    api: &'a dyn PatientApi,
    executor: RetryExecutor,
    options: RetrievalOptions,
    progress: &'a ProgressReporter,
}

impl<'a> PaginatedRetriever<'a> {
    pub fn new(
        api: &'a dyn PatientApi,
        options: RetrievalOptions,
        progress: &'a ProgressReporter,
    ) -> Self {
        Self {
            api,
            executor: RetryExecutor::new(options.retry.clone()),
            options,
            progress,
        }
    }

    /// Fetch a single page, retrying transient failures.
    ///
    /// `fetched` and `total_pages` only feed progress events.
    pub async fn fetch_page(
        &self,
        page: u32,
        total_pages: Option<u32>,
        fetched: usize,
    ) -> Result<PageEnvelope> {
        let context = format!("Fetching page {page}");
        let value = self
            .executor
            .execute_with_retry(
                &context,
                || self.api.fetch_page(page, self.options.page_limit),
                |notice| {
                    let reason = if notice.rate_limited {
                        "Rate limited"
                    } else {
                        "Transient failure"
                    };
                    self.progress.info(
                        page,
                        total_pages,
                        fetched,
                        format!(
                            "{reason} on page {page} (attempt {}/{}), retrying in {}ms",
                            notice.failed_attempt,
                            notice.max_attempts,
                            notice.delay.as_millis()
                        ),
                    );
                },
            )
            .await?;

        let envelope = PageEnvelope::from_json(&value);
        if envelope.data_malformed {
            warn!("Page {} response has no usable data array; treating as empty", page);
            self.progress.warning(
                page,
                total_pages,
                fetched,
                format!("Page {page} returned malformed data; continuing with no records"),
            );
        } else if envelope.dropped_records > 0 {
            self.progress.warning(
                page,
                total_pages,
                fetched,
                format!(
                    "Page {page}: skipped {} unreadable record(s)",
                    envelope.dropped_records
                ),
            );
        }

        Ok(envelope)
    }

    /// Fetch every page in order and concatenate the records.
    pub async fn fetch_all(&self) -> Result<Vec<Patient>> {
        let mut patients = Vec::new();

        self.progress.info(1, None, 0, "Fetching page 1...");
        let first = match self.fetch_page(1, None, 0).await {
            Ok(envelope) => envelope,
            Err(e) => {
                self.report_failure(1, None, patients.len(), &e);
                return Err(e);
            }
        };

        let total_pages = first.pagination.resolved_total_pages();
        patients.extend(first.patients);
        info!("Page 1/{} fetched ({} patients)", total_pages, patients.len());
        self.progress.success(
            1,
            Some(total_pages),
            patients.len(),
            format!("Fetched page 1/{total_pages} ({} patients so far)", patients.len()),
        );

        for page in 2..=total_pages {
            tokio::time::sleep(self.options.inter_page_delay).await;

            self.progress.info(
                page,
                Some(total_pages),
                patients.len(),
                format!("Fetching page {page}/{total_pages}..."),
            );

            let envelope = match self.fetch_page(page, Some(total_pages), patients.len()).await {
                Ok(envelope) => envelope,
                Err(e) => {
                    self.report_failure(page, Some(total_pages), patients.len(), &e);
                    return Err(e);
                }
            };

            patients.extend(envelope.patients);
            info!("Page {}/{} fetched ({} patients)", page, total_pages, patients.len());
            self.progress.success(
                page,
                Some(total_pages),
                patients.len(),
                format!(
                    "Fetched page {page}/{total_pages} ({} patients so far)",
                    patients.len()
                ),
            );
        }

        self.progress.success(
            total_pages,
            Some(total_pages),
            patients.len(),
            format!(
                "Fetched all {} patients across {total_pages} page(s)",
                patients.len()
            ),
        );

        Ok(patients)
    }

    pub async fn metrics(&self) -> RetryMetrics {
        self.executor.metrics().await
    }

    fn report_failure(
        &self,
        page: u32,
        total_pages: Option<u32>,
        fetched: usize,
        err: &crate::error::Error,
    ) {
        error!("Retrieval failed on page {} after {} patients: {}", page, fetched, err);
        self.progress.error(
            page,
            total_pages,
            fetched,
            format!("Failed to fetch page {page}: {err}"),
        );
    }
}

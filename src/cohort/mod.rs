//! Cohort extraction from assessed patients
//!
//! The three cohorts are independent: one patient may sit in any subset of
//! them. Identifiers keep the order the patients were assessed in.

use serde::{Deserialize, Serialize};

use crate::scoring::AssessedRecord;

/// Identifier lists submitted for scoring.
///
/// Field names match the remote submission endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSubmission {
    #[serde(rename = "high_risk_patients")]
    pub high_risk: Vec<String>,
    #[serde(rename = "fever_patients")]
    pub fever: Vec<String>,
    #[serde(rename = "data_quality_issues")]
    pub data_quality: Vec<String>,
}

impl CohortSubmission {
    pub fn is_empty(&self) -> bool {
        self.high_risk.is_empty() && self.fever.is_empty() && self.data_quality.is_empty()
    }
}

/// Counts for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSummary {
    pub total_patients: usize,
    pub high_risk: usize,
    pub fever: usize,
    pub data_quality: usize,
    /// Patients in no cohort at all
    pub clean_patients: usize,
}

/// Single pass over the assessments.
pub fn categorize(records: &[AssessedRecord]) -> CohortSubmission {
    let mut cohorts = CohortSubmission::default();

    for record in records {
        let id = record.patient_id();
        if record.is_high_risk {
            cohorts.high_risk.push(id.to_string());
        }
        if record.has_fever {
            cohorts.fever.push(id.to_string());
        }
        if record.has_data_quality_issues {
            cohorts.data_quality.push(id.to_string());
        }
    }

    cohorts
}

pub fn summarize(records: &[AssessedRecord]) -> CohortSummary {
    records.iter().fold(
        CohortSummary {
            total_patients: records.len(),
            ..Default::default()
        },
        |mut summary, record| {
            summary.high_risk += usize::from(record.is_high_risk);
            summary.fever += usize::from(record.has_fever);
            summary.data_quality += usize::from(record.has_data_quality_issues);
            if !(record.is_high_risk || record.has_fever || record.has_data_quality_issues) {
                summary.clean_patients += 1;
            }
            summary
        },
    )
}

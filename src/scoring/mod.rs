//! Deterministic vital-sign risk scoring
//!
//! Each vital sign is scored independently into a fixed band. Malformed or
//! missing readings never fail the assessment: they score zero and are
//! flagged invalid so the record lands in the data-quality cohort instead.
//!
//! The bands are constants. There is intentionally no way to configure them.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod age;
pub mod assess;
pub mod blood_pressure;
pub mod temperature;

pub use age::score_age;
pub use assess::{assess, assess_all, AssessedRecord, FieldScores, RiskScore};
pub use blood_pressure::score_blood_pressure;
pub use temperature::{score_temperature, FEVER_THRESHOLD};

/// Score for a single vital sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldScore {
    pub score: u8,
    pub is_valid: bool,
}

impl FieldScore {
    pub const INVALID: FieldScore = FieldScore {
        score: 0,
        is_valid: false,
    };

    pub fn valid(score: u8) -> Self {
        Self {
            score,
            is_valid: true,
        }
    }
}

/// Blood-pressure stage derived from the final band score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BpCategory {
    Normal,
    Elevated,
    #[serde(rename = "Stage 1")]
    Stage1,
    #[serde(rename = "Stage 2")]
    Stage2,
    Invalid,
}

impl BpCategory {
    /// Map a valid band score to its label. Anything below 2 reads as normal.
    pub fn from_score(score: u8) -> Self {
        match score {
            4 => BpCategory::Stage2,
            3 => BpCategory::Stage1,
            2 => BpCategory::Elevated,
            _ => BpCategory::Normal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BpCategory::Normal => "Normal",
            BpCategory::Elevated => "Elevated",
            BpCategory::Stage1 => "Stage 1",
            BpCategory::Stage2 => "Stage 2",
            BpCategory::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for BpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Blood-pressure score with its stage label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureScore {
    pub score: u8,
    pub is_valid: bool,
    pub category: BpCategory,
}

impl BloodPressureScore {
    pub const INVALID: BloodPressureScore = BloodPressureScore {
        score: 0,
        is_valid: false,
        category: BpCategory::Invalid,
    };

    pub fn valid(score: u8) -> Self {
        Self {
            score,
            is_valid: true,
            category: BpCategory::from_score(score),
        }
    }
}

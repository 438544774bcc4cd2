//! Per-patient risk assessment

use serde::{Deserialize, Serialize};

use super::{
    score_age, score_blood_pressure, score_temperature, BloodPressureScore, FieldScore,
    FEVER_THRESHOLD,
};
use crate::patient::Patient;

/// Total at or above which a patient is high risk.
pub const HIGH_RISK_THRESHOLD: u8 = 4;

/// Per-field contribution to the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub blood_pressure: u8,
    pub temperature: u8,
    pub age: u8,
    pub total: u8,
}

impl RiskScore {
    fn new(blood_pressure: u8, temperature: u8, age: u8) -> Self {
        Self {
            blood_pressure,
            temperature,
            age,
            total: blood_pressure + temperature + age,
        }
    }
}

/// Individual field results, kept for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldScores {
    pub blood_pressure: BloodPressureScore,
    pub temperature: FieldScore,
    pub age: FieldScore,
}

/// A patient with its derived risk classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedRecord {
    pub patient: Patient,
    pub risk_score: RiskScore,
    pub fields: FieldScores,
    pub is_high_risk: bool,
    pub has_fever: bool,
    pub has_data_quality_issues: bool,
}

impl AssessedRecord {
    pub fn patient_id(&self) -> &str {
        &self.patient.patient_id
    }
}

/// Assess one patient. Pure: the same record always yields the same result.
///
/// Invalid fields contribute whatever their scorer returned (zero) to the
/// total; invalidity only shows up through `has_data_quality_issues`.
pub fn assess(patient: &Patient) -> AssessedRecord {
    let bp = score_blood_pressure(patient.blood_pressure.as_deref());
    let temperature = score_temperature(&patient.temperature);
    let age = score_age(&patient.age);

    let risk_score = RiskScore::new(bp.score, temperature.score, age.score);

    let has_fever = temperature.is_valid
        && patient
            .temperature
            .as_f64()
            .is_some_and(|t| t >= FEVER_THRESHOLD);

    AssessedRecord {
        patient: patient.clone(),
        risk_score,
        fields: FieldScores {
            blood_pressure: bp,
            temperature,
            age,
        },
        is_high_risk: risk_score.total >= HIGH_RISK_THRESHOLD,
        has_fever,
        has_data_quality_issues: !bp.is_valid || !temperature.is_valid || !age.is_valid,
    }
}

/// Assess a batch, preserving order.
pub fn assess_all(patients: &[Patient]) -> Vec<AssessedRecord> {
    patients.iter().map(assess).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::VitalValue;

    #[test]
    fn test_total_is_sum_of_fields() {
        let patient = Patient::new("P1")
            .with_blood_pressure("142/88")
            .with_temperature(101.5)
            .with_age(70.0);

        let record = assess(&patient);
        assert_eq!(record.risk_score.blood_pressure, 4);
        assert_eq!(record.risk_score.temperature, 2);
        assert_eq!(record.risk_score.age, 2);
        assert_eq!(record.risk_score.total, 8);
        assert!(record.is_high_risk);
        assert!(record.has_fever);
        assert!(!record.has_data_quality_issues);
    }

    #[test]
    fn test_high_risk_threshold() {
        // 2 (elevated) + 1 (fever) + 1 (age) = 4
        let at_threshold = Patient::new("P2")
            .with_blood_pressure("125/75")
            .with_temperature(99.8)
            .with_age(30.0);
        assert_eq!(assess(&at_threshold).risk_score.total, 4);
        assert!(assess(&at_threshold).is_high_risk);

        // 2 + 0 + 1 = 3
        let below = Patient::new("P3")
            .with_blood_pressure("125/75")
            .with_temperature(98.2)
            .with_age(30.0);
        assert_eq!(assess(&below).risk_score.total, 3);
        assert!(!assess(&below).is_high_risk);
    }

    #[test]
    fn test_invalid_fields_flag_quality_without_penalty() {
        let patient = Patient::new("P4")
            .with_blood_pressure("150/")
            .with_temperature(98.6)
            .with_age(50.0);

        let record = assess(&patient);
        assert_eq!(record.risk_score.blood_pressure, 0);
        assert_eq!(record.risk_score.total, 1);
        assert!(record.has_data_quality_issues);
        assert!(!record.is_high_risk);
    }

    #[test]
    fn test_fever_requires_valid_reading() {
        let malformed = Patient::new("P5").with_temperature(VitalValue::Malformed("102".into()));
        assert!(!assess(&malformed).has_fever);

        let boundary = Patient::new("P6").with_temperature("99.6");
        assert!(assess(&boundary).has_fever);

        let normal = Patient::new("P7").with_temperature(99.5);
        assert!(!assess(&normal).has_fever);
    }

    #[test]
    fn test_fully_missing_record() {
        let record = assess(&Patient::new("P8"));
        assert_eq!(record.risk_score.total, 0);
        assert!(record.has_data_quality_issues);
        assert!(!record.has_fever);
        assert!(!record.is_high_risk);
    }

    #[test]
    fn test_assessment_is_idempotent() {
        let patient = Patient::new("P9")
            .with_blood_pressure("135/95")
            .with_temperature("100.1")
            .with_age("forty");

        let first = assess(&patient);
        let second = assess(&patient);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_assess_all_preserves_order() {
        let patients = vec![Patient::new("A"), Patient::new("B"), Patient::new("C")];
        let ids: Vec<_> = assess_all(&patients)
            .iter()
            .map(|r| r.patient_id().to_string())
            .collect();
        assert_eq!(ids, ["A", "B", "C"]);
    }
}

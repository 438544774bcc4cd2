use super::FieldScore;
use crate::patient::VitalValue;

/// Ages strictly above this score in the senior band.
pub const SENIOR_AGE: f64 = 65.0;

/// Score an age. Under-40 and 40–65 share a band.
pub fn score_age(age: &VitalValue) -> FieldScore {
    match age.as_f64() {
        Some(a) if a > SENIOR_AGE => FieldScore::valid(2),
        Some(_) => FieldScore::valid(1),
        None => FieldScore::INVALID,
    }
}

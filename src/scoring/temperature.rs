use super::FieldScore;
use crate::patient::VitalValue;

/// Lowest reading (°F) that counts as a fever.
pub const FEVER_THRESHOLD: f64 = 99.6;

/// Lowest reading (°F) in the high-fever band.
pub const HIGH_FEVER_THRESHOLD: f64 = 101.0;

/// Score a temperature reading. A normal reading is valid with score 0.
pub fn score_temperature(temperature: &VitalValue) -> FieldScore {
    match temperature.as_f64() {
        Some(t) if t >= HIGH_FEVER_THRESHOLD => FieldScore::valid(2),
        Some(t) if t >= FEVER_THRESHOLD => FieldScore::valid(1),
        Some(_) => FieldScore::valid(0),
        None => FieldScore::INVALID,
    }
}

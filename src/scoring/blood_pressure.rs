//! Blood-pressure band scoring
//!
//! Systolic and diastolic are banded independently and the higher stage wins.

use super::BloodPressureScore;
use crate::patient::parse_finite;

/// Score a `"<systolic>/<diastolic>"` reading.
pub fn score_blood_pressure(reading: Option<&str>) -> BloodPressureScore {
    let Some((systolic, diastolic)) = reading.and_then(parse_reading) else {
        return BloodPressureScore::INVALID;
    };

    let score = systolic_band(systolic).max(diastolic_band(systolic, diastolic));
    BloodPressureScore::valid(score)
}

fn parse_reading(raw: &str) -> Option<(f64, f64)> {
    if raw.trim().is_empty() {
        return None;
    }

    let mut parts = raw.split('/');
    let systolic = parts.next()?;
    let diastolic = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    Some((parse_finite(systolic)?, parse_finite(diastolic)?))
}

fn systolic_band(systolic: f64) -> u8 {
    if systolic >= 140.0 {
        4
    } else if systolic >= 130.0 {
        3
    } else if systolic >= 120.0 {
        2
    } else {
        1
    }
}

/// Diastolic under 80 only counts through the systolic normal/elevated
/// bands; at systolic >= 130 it contributes nothing and systolic decides.
fn diastolic_band(systolic: f64, diastolic: f64) -> u8 {
    if diastolic >= 90.0 {
        4
    } else if diastolic >= 80.0 {
        3
    } else if systolic < 120.0 {
        1
    } else if systolic < 130.0 {
        2
    } else {
        0
    }
}

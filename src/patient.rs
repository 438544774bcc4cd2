//! Patient records as delivered by the remote service
//!
//! The upstream data is loosely typed: vitals arrive as numbers, numeric
//! strings, garbage strings or not at all. Everything is normalized here so
//! that scoring never has to guess what a raw JSON value meant.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A numeric vital sign as it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VitalValue {
    /// Field absent or `null`
    #[default]
    Missing,
    /// A finite number, or a string that parsed as one
    Numeric(f64),
    /// Anything else, kept verbatim for display
    Malformed(String),
}

impl VitalValue {
    /// Classify a raw JSON value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => VitalValue::Missing,
            Value::Number(n) => match n.as_f64() {
                Some(v) if v.is_finite() => VitalValue::Numeric(v),
                _ => VitalValue::Malformed(n.to_string()),
            },
            Value::String(s) => Self::parse(s),
            other => VitalValue::Malformed(other.to_string()),
        }
    }

    /// Classify a string reading. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        match parse_finite(raw) {
            Some(v) => VitalValue::Numeric(v),
            None => VitalValue::Malformed(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VitalValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, VitalValue::Missing)
    }
}

impl From<f64> for VitalValue {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            VitalValue::Numeric(v)
        } else {
            VitalValue::Malformed(v.to_string())
        }
    }
}

impl From<&str> for VitalValue {
    fn from(raw: &str) -> Self {
        VitalValue::parse(raw)
    }
}

impl<'de> Deserialize<'de> for VitalValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(VitalValue::from_json(&value))
    }
}

impl Serialize for VitalValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            VitalValue::Missing => serializer.serialize_none(),
            VitalValue::Numeric(v) => serializer.serialize_f64(*v),
            VitalValue::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

/// Parse a trimmed decimal string, rejecting empty input, `NaN` and infinities.
pub(crate) fn parse_finite(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A single patient record. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(deserialize_with = "identifier")]
    pub patient_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub age: VitalValue,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub temperature: VitalValue,
    #[serde(default, deserialize_with = "lenient_text")]
    pub visit_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub medications: Option<String>,
}

impl Patient {
    /// Minimal record with only an identifier; vitals start out missing.
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            name: None,
            age: VitalValue::Missing,
            gender: None,
            blood_pressure: None,
            temperature: VitalValue::Missing,
            visit_date: None,
            diagnosis: None,
            medications: None,
        }
    }

    pub fn with_blood_pressure(mut self, reading: &str) -> Self {
        self.blood_pressure = Some(reading.to_string());
        self
    }

    pub fn with_temperature(mut self, temperature: impl Into<VitalValue>) -> Self {
        self.temperature = temperature.into();
        self
    }

    pub fn with_age(mut self, age: impl Into<VitalValue>) -> Self {
        self.age = age.into();
        self
    }
}

/// Identifiers are strings upstream, but some records carry bare numbers.
fn identifier<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid patient_id: {other}"
        ))),
    }
}

/// Accept any JSON scalar for a text field; non-strings keep their JSON text.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

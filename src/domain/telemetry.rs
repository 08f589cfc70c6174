// Telemetry sample domain models
use serde::Deserialize;

/// A raw telemetry value as delivered by the data feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl SampleValue {
    /// Numeric view of the value. Numeric strings are accepted since feeds
    /// often deliver attributes as text. NaN and infinities are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            SampleValue::Number(value) => Some(*value),
            SampleValue::Text(text) => text.trim().parse::<f64>().ok(),
            SampleValue::Bool(_) => None,
        };
        value.filter(|v| v.is_finite())
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        SampleValue::Number(value)
    }
}

impl From<bool> for SampleValue {
    fn from(value: bool) -> Self {
        SampleValue::Bool(value)
    }
}

impl From<&str> for SampleValue {
    fn from(value: &str) -> Self {
        SampleValue::Text(value.to_string())
    }
}

impl From<String> for SampleValue {
    fn from(value: String) -> Self {
        SampleValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: SampleValue,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: impl Into<SampleValue>) -> Self {
        Self {
            time_ms,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_view() {
        assert_eq!(SampleValue::from(10.5).as_f64(), Some(10.5));
        assert_eq!(SampleValue::from(" 48.2 ").as_f64(), Some(48.2));
        assert_eq!(SampleValue::from("truck").as_f64(), None);
        assert_eq!(SampleValue::from(true).as_f64(), None);
    }

    #[test]
    fn test_non_finite_is_not_numeric() {
        assert_eq!(SampleValue::from("NaN").as_f64(), None);
        assert_eq!(SampleValue::from(" inf ").as_f64(), None);
        assert_eq!(SampleValue::from("-infinity").as_f64(), None);
        assert_eq!(SampleValue::from(f64::NAN).as_f64(), None);
        assert_eq!(SampleValue::from(f64::NEG_INFINITY).as_f64(), None);
        assert_eq!(SampleValue::from("-12.25").as_f64(), Some(-12.25));
    }

    #[test]
    fn test_untagged_deserialize() {
        let values: Vec<SampleValue> = serde_json::from_str(r#"[1.5, "on", false]"#).unwrap();
        assert_eq!(
            values,
            vec![
                SampleValue::Number(1.5),
                SampleValue::Text("on".to_string()),
                SampleValue::Bool(false)
            ]
        );
    }
}

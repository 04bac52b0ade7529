//! Structured metric records returned by the extractor

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;

/// One statistical finding extracted from a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchMetric {
    /// The title or main subject of the text
    pub paper_title: String,
    /// The name of the metric (e.g. Accuracy, F1-Score, ROI)
    pub metric_name: String,
    /// The numerical value of the metric
    #[serde(deserialize_with = "lenient_number")]
    pub metric_value: f64,
    /// The unit (e.g. %, ms, $)
    #[serde(default, deserialize_with = "lenient_unit")]
    pub unit: Option<String>,
    /// The year this data point is from
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
}

/// The fixed schema the model must answer with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub metrics: Vec<ResearchMetric>,
}

impl ExtractionResponse {
    /// JSON schema sent to the model alongside the extraction prompt
    pub fn json_schema() -> Value {
        json!({
            "title": "ExtractionResponse",
            "type": "object",
            "properties": {
                "metrics": {
                    "type": "array",
                    "items": {
                        "title": "ResearchMetric",
                        "type": "object",
                        "properties": {
                            "paper_title": {"type": "string", "description": "The title or main subject of the text"},
                            "metric_name": {"type": "string", "description": "The name of the metric (e.g., Accuracy, F1-Score, ROI)"},
                            "metric_value": {"type": "number", "description": "The numerical value of the metric"},
                            "unit": {"type": ["string", "null"], "description": "The unit (e.g., %, ms, $)"},
                            "year": {"type": ["integer", "null"], "description": "The year this data point is from"}
                        },
                        "required": ["paper_title", "metric_name", "metric_value"]
                    }
                }
            },
            "required": ["metrics"]
        })
    }
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?|-?\.\d+").expect("valid number regex"))
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(1[89]\d{2}|2\d{3})\b").expect("valid year regex"))
}

/// Parse the first number in a string such as `"94.5%"`, `"1,024 ms"` or `"94,5 %"`.
///
/// A single comma followed by one or two digits (and no point) is a decimal
/// comma; commas before groups of three digits are thousands separators.
/// Anything else that mixes the two is rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let found = number_pattern().find(raw)?.as_str().trim_end_matches(',');

    let normalized = match found.rsplit_once(',') {
        Some((head, tail)) if !found.contains('.') && tail.len() <= 2 => {
            if head.contains(',') {
                return None;
            }
            format!("{}.{}", head, tail)
        }
        _ => found.replace(',', ""),
    };

    normalized.parse().ok()
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("metric_value is not representable")),
        Value::String(s) => parse_number(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("metric_value '{}' is not numeric", s))),
        other => Err(serde::de::Error::custom(format!(
            "metric_value must be a number, got {}",
            other
        ))),
    }
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => year_pattern()
            .find(&s)
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    })
}

fn lenient_unit<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_shape() {
        let parsed: ExtractionResponse = serde_json::from_str(
            r#"{"metrics": [{"paper_title": "Our study", "metric_name": "Accuracy",
                "metric_value": 94.5, "unit": "%", "year": 2023}]}"#,
        )
        .unwrap();

        assert_eq!(
            parsed.metrics[0],
            ResearchMetric {
                paper_title: "Our study".to_string(),
                metric_name: "Accuracy".to_string(),
                metric_value: 94.5,
                unit: Some("%".to_string()),
                year: Some(2023),
            }
        );
    }

    #[test]
    fn test_lenient_values() {
        let parsed: ExtractionResponse = serde_json::from_str(
            r#"{"metrics": [
                {"paper_title": "A", "metric_name": "Accuracy", "metric_value": "88.0%", "year": "in 2022"},
                {"paper_title": "B", "metric_name": "Latency", "metric_value": "1,024 ms", "unit": ""},
                {"paper_title": "C", "metric_name": "F1", "metric_value": 0.91, "year": null}
            ]}"#,
        )
        .unwrap();

        assert_eq!(parsed.metrics[0].metric_value, 88.0);
        assert_eq!(parsed.metrics[0].year, Some(2022));
        assert_eq!(parsed.metrics[1].metric_value, 1024.0);
        assert_eq!(parsed.metrics[1].unit, None);
        assert_eq!(parsed.metrics[1].year, None);
        assert_eq!(parsed.metrics[2].year, None);
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_number("94,5%"), Some(94.5));
        assert_eq!(parse_number("0,87"), Some(0.87));
        assert_eq!(parse_number("1,024 ms"), Some(1024.0));
        assert_eq!(parse_number("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_number("1,024.5"), Some(1024.5));
        assert_eq!(parse_number("12, 13 and 14"), Some(12.0));
        assert_eq!(parse_number("1,2,3"), None);

        let metric: ResearchMetric = serde_json::from_str(
            r#"{"paper_title": "A", "metric_name": "Accuracy", "metric_value": "94,5 %"}"#,
        )
        .unwrap();
        assert_eq!(metric.metric_value, 94.5);
    }

    #[test]
    fn test_non_numeric_value_is_rejected() {
        let result: Result<ResearchMetric, _> = serde_json::from_str(
            r#"{"paper_title": "A", "metric_name": "Accuracy", "metric_value": "high"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = ExtractionResponse::json_schema();
        let required = &schema["properties"]["metrics"]["items"]["required"];
        assert_eq!(required.as_array().map(|a| a.len()), Some(3));
    }
}

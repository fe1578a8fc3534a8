use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEY_SEPARATOR: &str = " | ";

/// One page measurement as returned by the stats service.
///
/// Only the fields the dashboard reads are typed, everything else the service sends is
/// kept in `extra` so the stored document is the raw result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementResult {
    pub requested_url: String,
    pub audits: Audits,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audits {
    pub interactive: Audit,
    #[serde(
        rename = "first-contentful-paint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_contentful_paint: Option<LenientAudit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    /// Milliseconds
    pub numeric_value: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An audit the service may report as errored, without a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LenientAudit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MeasurementResult {
    pub fn time_to_interactive_ms(&self) -> f64 {
        self.audits.interactive.numeric_value
    }

    pub fn first_contentful_paint_ms(&self) -> Option<f64> {
        self.audits
            .first_contentful_paint
            .as_ref()
            .and_then(|audit| audit.numeric_value)
    }
}

/// A stored run: both results, when they were stored and the key of the URL pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPair {
    #[serde(rename = "_id")]
    pub id: String,
    pub data: [MeasurementResult; 2],
    pub timestamp: DateTime<Utc>,
    pub urls: String,
}

/// Order sensitive, no normalization: `http://a` and `http://a/` are different keys.
pub fn pair_key(first: &MeasurementResult, second: &MeasurementResult) -> String {
    [
        first.requested_url.as_str(),
        second.requested_url.as_str(),
    ]
    .join(KEY_SEPARATOR)
}

#[cfg(test)]
pub mod fixtures {
    use serde_json::json;

    use super::MeasurementResult;

    pub fn measurement(url: &str, interactive_ms: f64) -> MeasurementResult {
        serde_json::from_value(json!({
            "requestedUrl": url,
            "finalUrl": url,
            "audits": {
                "interactive": { "id": "interactive", "numericValue": interactive_ms },
                "first-contentful-paint": { "id": "first-contentful-paint", "numericValue": 800.0 }
            }
        }))
        .expect("fixture measurement")
    }
}

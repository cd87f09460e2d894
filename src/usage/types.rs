//! Usage record types
//!
//! [`RawUsage`] keeps whatever a provider reported; [`CanonicalUsage`] is the
//! fixed record every downstream consumer reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider-reported usage counters, in whatever shape they arrived.
///
/// Construction never fails: non-object input yields an empty record, and
/// counters that are not usable numbers read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct RawUsage {
    fields: Map<String, Value>,
}

impl From<Value> for RawUsage {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }
}

impl From<RawUsage> for Value {
    fn from(raw: RawUsage) -> Self {
        Value::Object(raw.fields)
    }
}

impl RawUsage {
    pub fn new(prompt_tokens: i64, completion_tokens: i64) -> Self {
        Self::default()
            .with_field("prompt_tokens", prompt_tokens)
            .with_field("completion_tokens", completion_tokens)
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Prompt tokens; Responses-style reports call them `input_tokens`.
    pub fn prompt_tokens(&self) -> Option<i64> {
        self.count("prompt_tokens").or_else(|| self.count("input_tokens"))
    }

    /// Completion tokens; Responses-style reports call them `output_tokens`.
    pub fn completion_tokens(&self) -> Option<i64> {
        self.count("completion_tokens")
            .or_else(|| self.count("output_tokens"))
    }

    pub fn cache_read_tokens(&self) -> Option<i64> {
        self.count("cache_read_input_tokens")
    }

    pub fn cache_creation_tokens(&self) -> Option<i64> {
        self.count("cache_creation_input_tokens")
    }

    /// Counter at a dotted path such as `prompt_tokens_details.cached_tokens`.
    pub fn count(&self, path: &str) -> Option<i64> {
        let mut keys = path.split('.');
        let first = self.fields.get(keys.next()?)?;
        keys.try_fold(first, |value, key| value.get(key))
            .and_then(lenient_count)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Integers, floats (truncated) and numeric strings; everything else is absent.
fn lenient_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// Per-request prompt breakdown exposed to downstream consumers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTokensDetails {
    pub cached_tokens: i64,
}

/// Normalized usage record
///
/// `total_tokens == prompt_tokens + completion_tokens` always holds. Prompt
/// tokens may legitimately be smaller than cache-read tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    #[serde(rename = "cache_read_input_tokens")]
    pub cache_read_tokens: i64,
    #[serde(rename = "cache_creation_input_tokens")]
    pub cache_creation_tokens: i64,
    pub total_tokens: i64,
    pub prompt_tokens_details: PromptTokensDetails,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_usage_reads_chat_names() {
        let raw = RawUsage::from(json!({"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}));
        assert_eq!(raw.prompt_tokens(), Some(10));
        assert_eq!(raw.completion_tokens(), Some(5));
        assert_eq!(raw.cache_read_tokens(), None);
    }

    #[test]
    fn raw_usage_reads_responses_names() {
        let raw = RawUsage::from(json!({"input_tokens": 12, "output_tokens": 3}));
        assert_eq!(raw.prompt_tokens(), Some(12));
        assert_eq!(raw.completion_tokens(), Some(3));
    }

    #[test]
    fn raw_usage_prefers_chat_names_when_both_present() {
        let raw = RawUsage::from(json!({"prompt_tokens": 1, "input_tokens": 99}));
        assert_eq!(raw.prompt_tokens(), Some(1));
    }

    #[test]
    fn raw_usage_lenient_numbers() {
        let raw = RawUsage::from(json!({
            "prompt_tokens": "42",
            "completion_tokens": 7.9,
            "cache_read_input_tokens": null,
            "cache_creation_input_tokens": "lots",
            "total_tokens": true
        }));
        assert_eq!(raw.prompt_tokens(), Some(42));
        assert_eq!(raw.completion_tokens(), Some(7));
        assert_eq!(raw.cache_read_tokens(), None);
        assert_eq!(raw.cache_creation_tokens(), None);
        assert_eq!(raw.count("total_tokens"), None);
    }

    #[test]
    fn raw_usage_dotted_path() {
        let raw = RawUsage::from(json!({"prompt_tokens_details": {"cached_tokens": 64}}));
        assert_eq!(raw.count("prompt_tokens_details.cached_tokens"), Some(64));
        assert_eq!(raw.count("prompt_tokens_details.audio_tokens"), None);
        assert_eq!(raw.count("missing.cached_tokens"), None);
    }

    #[test]
    fn raw_usage_from_non_object_is_empty() {
        assert!(RawUsage::from(json!(null)).is_empty());
        assert!(RawUsage::from(json!([1, 2])).is_empty());
        let raw: RawUsage = serde_json::from_str("\"oops\"").unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn raw_usage_serializes_as_reported() {
        let raw = RawUsage::new(3, 4).with_field("cached_tokens", 2);
        let value = serde_json::to_value(&raw).unwrap();
        assert_eq!(value, json!({"prompt_tokens": 3, "completion_tokens": 4, "cached_tokens": 2}));
    }

    #[test]
    fn canonical_usage_serializes_gateway_field_names() {
        let usage = CanonicalUsage {
            prompt_tokens: 100,
            completion_tokens: 20,
            cache_read_tokens: 30,
            cache_creation_tokens: 5,
            total_tokens: 120,
            prompt_tokens_details: PromptTokensDetails { cached_tokens: 30 },
        };
        let value = serde_json::to_value(usage).unwrap();
        assert_eq!(value["cache_read_input_tokens"], 30);
        assert_eq!(value["cache_creation_input_tokens"], 5);
        assert_eq!(value["prompt_tokens_details"]["cached_tokens"], 30);
    }
}

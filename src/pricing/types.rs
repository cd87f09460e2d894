use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PricingError;

/// Per-token prices for one model (per token, not per million)
///
/// A table without an input price cannot produce an authoritative cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    pub input_cost_per_token: Option<f64>,
    #[serde(default)]
    pub output_cost_per_token: f64,
    #[serde(default)]
    pub cache_read_cost_per_token: f64,
    #[serde(default)]
    pub cache_creation_cost_per_token: f64,
}

const INPUT_KEYS: &[&str] = &["input_cost_per_token"];
const OUTPUT_KEYS: &[&str] = &["output_cost_per_token"];
const CACHE_READ_KEYS: &[&str] = &["cache_read_input_token_cost", "cache_read_cost_per_token"];
const CACHE_CREATION_KEYS: &[&str] = &[
    "cache_creation_input_token_cost",
    "cache_creation_cost_per_token",
];

impl PricingTable {
    /// Parse a LiteLLM-style model info map.
    ///
    /// Absent and null prices read as unset (0 for everything but input).
    /// Anything else that is not a non-negative number is a fault.
    pub fn from_value(value: &Value) -> Result<Self, PricingError> {
        let Value::Object(map) = value else {
            return Err(PricingError::NotAnObject {
                kind: kind_of(value),
            });
        };

        Ok(Self {
            input_cost_per_token: price(map, INPUT_KEYS)?,
            output_cost_per_token: price(map, OUTPUT_KEYS)?.unwrap_or(0.0),
            cache_read_cost_per_token: price(map, CACHE_READ_KEYS)?.unwrap_or(0.0),
            cache_creation_cost_per_token: price(map, CACHE_CREATION_KEYS)?.unwrap_or(0.0),
        })
    }

    pub fn has_input_price(&self) -> bool {
        self.input_cost_per_token.is_some()
    }
}

/// First key present with a non-null value wins.
fn price(map: &Map<String, Value>, keys: &[&'static str]) -> Result<Option<f64>, PricingError> {
    let Some((field, value)) = keys
        .iter()
        .find_map(|&k| map.get(k).filter(|v| !v.is_null()).map(|v| (k, v)))
    else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(parsed) = parsed.filter(|p| p.is_finite()) else {
        return Err(PricingError::NonNumeric {
            field,
            value: value.to_string(),
        });
    };
    if parsed < 0.0 {
        return Err(PricingError::Negative {
            field,
            value: parsed,
        });
    }
    Ok(Some(parsed))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Deployment snapshots
//!
//! Registry entries arrive as loosely-typed maps, either flat
//! (`deployment_id`, `model_name`, `weight`) or in the gateway's nested
//! shape (`model_info.id`, `litellm_params.weight`). They are mapped to
//! [`Deployment`] once here, with the default weight applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One physical backend instance of a logical model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub model_name: String,
    pub deployment_id: String,
    pub weight: u64,
    #[serde(default = "default_healthy")]
    pub healthy: bool,
}

fn default_healthy() -> bool {
    true
}

impl Deployment {
    pub fn new(model_name: impl Into<String>, deployment_id: impl Into<String>, weight: u64) -> Self {
        Self {
            model_name: model_name.into(),
            deployment_id: deployment_id.into(),
            weight,
            healthy: true,
        }
    }

    /// Map a registry entry, returning `None` when it carries no usable id.
    pub fn from_registry(entry: &Value, default_weight: u64) -> Option<Self> {
        let deployment_id = str_at(entry, &["deployment_id"])
            .or_else(|| str_at(entry, &["model_info", "id"]))
            .or_else(|| str_at(entry, &["id"]))?;

        let model_name = str_at(entry, &["model_name"]).unwrap_or_default();

        let weight = entry
            .get("weight")
            .or_else(|| lookup(entry, &["litellm_params", "weight"]))
            .and_then(weight_value)
            .unwrap_or(default_weight);

        let healthy = entry.get("healthy").and_then(Value::as_bool).unwrap_or(true);

        Some(Self {
            model_name,
            deployment_id,
            weight,
            healthy,
        })
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    match lookup(value, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Weights may be integers, floats or numeric strings; negatives clamp to 0.
fn weight_value(value: &Value) -> Option<u64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.max(0.0) as u64)
}

/// Map every entry of a registry snapshot, dropping entries without an id.
pub fn deployments_from_registry(entries: &[Value], default_weight: u64) -> Vec<Deployment> {
    entries
        .iter()
        .filter_map(|entry| {
            let deployment = Deployment::from_registry(entry, default_weight);
            if deployment.is_none() {
                tracing::warn!(entry = %entry, "dropping registry entry without a deployment id");
            }
            deployment
        })
        .collect()
}

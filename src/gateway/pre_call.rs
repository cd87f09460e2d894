//! Pre-dispatch hooks: sticky deployment filtering and prompt-cache markers

use serde_json::{Value, json};

use crate::routing::{Deployment, Selection, select_index};

/// Session id carried in the request's `metadata.session_id`
pub fn session_id(request: &Value) -> Option<&str> {
    request
        .get("metadata")?
        .get("session_id")?
        .as_str()
        .filter(|s| !s.is_empty())
}

/// Narrow the healthy deployments to the session's sticky choice.
///
/// Registry maps are converted once; the selected deployment's own registry map
/// is returned so the dispatcher sees exactly what the registry supplied.
/// Without a session the list comes back unchanged, and an empty result
/// means no deployment serves `model` (the dispatcher falls back).
pub fn filter_deployments(
    model: &str,
    healthy: &[Value],
    request: Option<&Value>,
    default_weight: u64,
) -> Vec<Value> {
    let session = request.and_then(session_id);
    if session.is_none() || healthy.is_empty() {
        return healthy.to_vec();
    }

    let (origins, deployments): (Vec<usize>, Vec<Deployment>) = healthy
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let deployment = Deployment::from_registry(entry, default_weight);
            if deployment.is_none() {
                tracing::warn!(index = i, "registry entry has no deployment id, skipping");
            }
            deployment.map(|d| (i, d))
        })
        .unzip();

    match select_index(session, model, &deployments) {
        Selection::Passthrough => healthy.to_vec(),
        Selection::NoMatch => Vec::new(),
        Selection::Selected(i) => vec![healthy[origins[i]].clone()],
    }
}

fn cache_control() -> Value {
    json!({"type": "ephemeral"})
}

fn mark(item: &mut Value) {
    if let Some(map) = item.as_object_mut() {
        map.insert("cache_control".to_string(), cache_control());
    }
}

/// Add prompt-cache breakpoints when `metadata.enable_cache` is true.
///
/// Every system message, the last message and the last tool are marked.
/// Returns whether the request was changed.
pub fn apply_prompt_caching(request: &mut Value) -> bool {
    let enabled = request
        .get("metadata")
        .and_then(|m| m.get("enable_cache"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !enabled {
        return false;
    }

    let mut changed = false;
    if let Some(messages) = request.get_mut("messages").and_then(Value::as_array_mut) {
        for message in messages.iter_mut() {
            if message.get("role").and_then(Value::as_str) == Some("system") {
                mark(message);
                changed = true;
            }
        }
        if let Some(last) = messages.last_mut() {
            mark(last);
            changed = true;
        }
    }
    if let Some(last_tool) = request
        .get_mut("tools")
        .and_then(Value::as_array_mut)
        .and_then(|tools| tools.last_mut())
    {
        mark(last_tool);
        changed = true;
    }

    tracing::debug!(
        session_id = session_id(request).unwrap_or_default(),
        changed,
        "prompt caching applied"
    );
    changed
}

//! Post-call hook: usage reconciliation and cost override
//!
//! The call map is only touched once every step has succeeded, so a fault
//! anywhere leaves the gateway's own usage and cost exactly as they were.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ReconcileError;
use crate::pricing::{CostResult, PricingCatalog, compute_cost, resolve_pricing};
use crate::usage::{CallContext, CanonicalUsage, Correction, RawUsage, UsageEngine};

/// Everything reconciliation decided for one call
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub model: Option<String>,
    pub raw_usage: RawUsage,
    pub usage: CanonicalUsage,
    pub corrections: Vec<Correction>,
    pub cost: CostResult,
    pub prior_cost: Option<f64>,
    pub final_cost: Option<f64>,
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Model the response reports, else the one the call requested.
pub fn model_name(call: &Value, response: &Value) -> Option<String> {
    non_empty_str(response.get("model"))
        .or_else(|| non_empty_str(call.get("model")))
        .or_else(|| non_empty_str(call.get("litellm_params").and_then(|p| p.get("model"))))
}

/// Work out the reconciliation for a call without modifying it.
///
/// Returns `Ok(None)` when the response carries no usage.
pub fn plan_reconciliation(
    engine: &UsageEngine,
    catalog: &PricingCatalog,
    call: &Value,
    response: &Value,
) -> Result<Option<Reconciliation>, ReconcileError> {
    let Some(usage) = response.get("usage").filter(|u| !u.is_null()) else {
        return Ok(None);
    };

    let model = model_name(call, response);
    let ctx = CallContext::from_call(call);
    let raw_usage = RawUsage::from(usage.clone());
    let (usage, corrections) = engine.normalize_traced(&raw_usage, model.as_deref(), &ctx);

    let metadata = call
        .get("litellm_params")
        .and_then(|p| p.get("metadata"))
        .unwrap_or(&Value::Null);
    let pricing = resolve_pricing(metadata, catalog)?;
    let cost = compute_cost(&usage, pricing.as_ref());

    let prior_cost = call.get("response_cost").and_then(Value::as_f64);
    let final_cost = cost.apply(prior_cost);

    tracing::debug!(
        model = model.as_deref().unwrap_or_default(),
        corrections = corrections.len(),
        valid = cost.valid,
        custom_cost = cost.amount,
        prior_cost = ?prior_cost,
        final_cost = ?final_cost,
        "usage reconciled"
    );

    Ok(Some(Reconciliation {
        model,
        raw_usage,
        usage,
        corrections,
        cost,
        prior_cost,
        final_cost,
    }))
}

/// Write a reconciliation back onto the call map.
///
/// The canonical usage goes to `standard_logging_object.hidden_params.usage_object`
/// when a logging object exists; `response_cost` is replaced only when the
/// computed cost is valid.
pub fn apply_reconciliation(call: &mut Value, rec: &Reconciliation) -> Result<(), ReconcileError> {
    let usage_object = serde_json::to_value(rec.usage)?;

    if let Some(logging) = call
        .get_mut("standard_logging_object")
        .and_then(Value::as_object_mut)
    {
        let hidden = logging
            .entry("hidden_params")
            .or_insert_with(|| Value::Object(Map::new()));
        if !hidden.is_object() {
            *hidden = Value::Object(Map::new());
        }
        if let Some(hidden) = hidden.as_object_mut() {
            hidden.insert("usage_object".to_string(), usage_object);
        }
    }

    if rec.cost.valid
        && let Some(map) = call.as_object_mut()
    {
        map.insert("response_cost".to_string(), Value::from(rec.cost.amount));
    }
    Ok(())
}

/// Reconcile one completed call in place.
///
/// Never fails: a fault is logged and the call is left untouched.
pub fn reconcile_call(
    engine: &UsageEngine,
    catalog: &PricingCatalog,
    call: &mut Value,
    response: &Value,
) -> Option<Reconciliation> {
    let outcome = plan_reconciliation(engine, catalog, call, response).and_then(|rec| match rec {
        Some(rec) => apply_reconciliation(call, &rec).map(|()| Some(rec)),
        None => Ok(None),
    });

    match outcome {
        Ok(rec) => rec,
        Err(err) => {
            tracing::warn!("usage reconciliation skipped, keeping gateway estimate: {err}");
            None
        }
    }
}

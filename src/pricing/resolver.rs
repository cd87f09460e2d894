use std::collections::HashMap;

use serde_json::Value;

use super::catalog::PricingCatalog;
use super::types::PricingTable;
use crate::error::PricingError;

/// Exact name first, then the name without its provider prefix.
///
/// No fuzzy matching: a name missing from the catalog must resolve to
/// nothing so the caller can fall back to the call's own pricing.
pub(super) fn lookup_known<'a>(
    model: &str,
    models: &'a HashMap<String, PricingTable>,
) -> Option<&'a PricingTable> {
    let model = model.trim();
    if model.is_empty() {
        return None;
    }

    if let Some(pricing) = models.get(model) {
        return Some(pricing);
    }

    // e.g. "bedrock/", "openai/"
    model
        .rsplit_once('/')
        .map(|(_, bare)| bare)
        .filter(|bare| !bare.is_empty())
        .and_then(|bare| models.get(bare))
}

/// Resolve the pricing for a call from its gateway metadata.
///
/// A `deployment` found in the catalog wins. Otherwise the table embedded
/// as `model_info` is used; with neither, no pricing is available. A
/// malformed embedded table is a fault for the caller to absorb.
pub fn resolve_pricing(
    metadata: &Value,
    catalog: &PricingCatalog,
) -> Result<Option<PricingTable>, PricingError> {
    if let Some(deployment) = metadata
        .get("deployment")
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
    {
        if let Some(table) = catalog.get(deployment) {
            return Ok(Some(table.clone()));
        }
        tracing::debug!(
            deployment,
            "deployment not in pricing catalog, falling back to model_info"
        );
    }

    match metadata.get("model_info") {
        None | Some(Value::Null) => Ok(None),
        Some(info) => PricingTable::from_value(info).map(Some),
    }
}

use serde::Serialize;

use super::types::PricingTable;
use crate::usage::CanonicalUsage;

/// Outcome of a cost computation
///
/// `valid == false` means no authoritative price was available and the
/// caller should keep its own estimate; it is not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostResult {
    pub valid: bool,
    pub amount: f64,
}

impl CostResult {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            amount: 0.0,
        }
    }

    /// The estimate the caller should keep: ours when valid, theirs otherwise.
    pub fn apply(&self, prior: Option<f64>) -> Option<f64> {
        if self.valid { Some(self.amount) } else { prior }
    }
}

/// Compute the cost of one call.
///
/// Cache-read tokens are billed at their own rate and removed from the
/// input count. The difference is not clamped, so inconsistent upstream
/// data can produce a negative input component.
pub fn compute_cost(usage: &CanonicalUsage, pricing: Option<&PricingTable>) -> CostResult {
    let Some(pricing) = pricing else {
        return CostResult::invalid();
    };
    let Some(input_price) = pricing.input_cost_per_token else {
        return CostResult::invalid();
    };

    let actual_input = usage.prompt_tokens - usage.cache_read_tokens;
    let amount = actual_input as f64 * input_price
        + usage.cache_read_tokens as f64 * pricing.cache_read_cost_per_token
        + usage.cache_creation_tokens as f64 * pricing.cache_creation_cost_per_token
        + usage.completion_tokens as f64 * pricing.output_cost_per_token;

    CostResult {
        valid: true,
        amount,
    }
}

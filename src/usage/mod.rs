//! Usage reconciliation: provider reports in, canonical records out

mod context;
mod normalize;
mod types;

pub use context::CallContext;
pub use normalize::{Correction, NormalizationRules, PromptCorrectionRule, UsageEngine};
pub use types::{CanonicalUsage, PromptTokensDetails, RawUsage};

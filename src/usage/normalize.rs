//! Provider usage normalization
//!
//! Rules run in a fixed order, each only when its own precondition holds:
//!
//! 1. cache-field aliasing: a cache-read count reported under another name
//!    fills the canonical field when that field is absent or zero
//! 2. prompt correction: endpoint/model pairs known to report prompt tokens
//!    exclusive of cache tokens get them added back
//! 3. cache inference: for models that drop cache counts on streamed
//!    responses, a large prompt with no cache-read count is assumed cached
//!
//! Rule 3 is an approximation. It misclassifies genuinely uncached large
//! prompts and has no confirmation signal from the provider.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::CallContext;
use super::types::{CanonicalUsage, PromptTokensDetails, RawUsage};
use crate::consts::CACHE_INFERENCE_THRESHOLD;

/// An endpoint + model-family pair whose prompt count excludes cache tokens.
///
/// Both sides must match: the same endpoint can host model families with
/// different reporting conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCorrectionRule {
    pub name: String,
    /// Every marker must appear in the endpoint
    pub endpoint_contains: Vec<String>,
    /// At least one marker must appear in the provider model (case-insensitive)
    pub model_contains: Vec<String>,
}

impl PromptCorrectionRule {
    pub fn matches(&self, ctx: &CallContext) -> bool {
        if self.endpoint_contains.is_empty() || self.model_contains.is_empty() {
            return false;
        }
        let (Some(api_base), Some(model)) = (ctx.api_base.as_deref(), ctx.provider_model.as_deref())
        else {
            return false;
        };
        let model = model.to_lowercase();
        self.endpoint_contains
            .iter()
            .all(|marker| api_base.contains(marker.as_str()))
            && self
                .model_contains
                .iter()
                .any(|marker| model.contains(&marker.to_lowercase()))
    }
}

/// Normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationRules {
    /// Alternative names (dotted paths allowed) for the cache-read count
    pub cache_aliases: Vec<String>,
    /// Exact model names that get the cache-count inference
    pub cache_inference_models: Vec<String>,
    pub cache_inference_threshold: i64,
    pub prompt_corrections: Vec<PromptCorrectionRule>,
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self {
            cache_aliases: vec![
                "cached_tokens".to_string(),
                "prompt_tokens_details.cached_tokens".to_string(),
                "input_tokens_details.cached_tokens".to_string(),
            ],
            cache_inference_models: vec!["kimi-k2-turbo-preview".to_string()],
            cache_inference_threshold: CACHE_INFERENCE_THRESHOLD,
            prompt_corrections: vec![PromptCorrectionRule {
                name: "bedrock-claude".to_string(),
                endpoint_contains: vec!["bedrock-runtime".to_string(), "amazonaws.com".to_string()],
                model_contains: vec!["claude".to_string()],
            }],
        }
    }
}

/// A normalization rule that changed the record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    CacheAlias { field: String, tokens: i64 },
    PromptIncludesCache { rule: String, added: i64 },
    InferredCacheRead { tokens: i64 },
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correction::CacheAlias { field, .. } => write!(f, "alias:{field}"),
            Correction::PromptIncludesCache { rule, .. } => write!(f, "prompt+cache:{rule}"),
            Correction::InferredCacheRead { .. } => write!(f, "inferred-cache"),
        }
    }
}

/// Turns provider usage reports into [`CanonicalUsage`]
#[derive(Debug, Clone, Default)]
pub struct UsageEngine {
    rules: NormalizationRules,
}

impl UsageEngine {
    pub fn new(rules: NormalizationRules) -> Self {
        Self { rules }
    }

    pub fn normalize(
        &self,
        raw: &RawUsage,
        model_name: Option<&str>,
        ctx: &CallContext,
    ) -> CanonicalUsage {
        self.normalize_traced(raw, model_name, ctx).0
    }

    /// Like [`normalize`](Self::normalize), also reporting which rules fired.
    pub fn normalize_traced(
        &self,
        raw: &RawUsage,
        model_name: Option<&str>,
        ctx: &CallContext,
    ) -> (CanonicalUsage, Vec<Correction>) {
        let mut corrections = Vec::new();

        let mut prompt = raw.prompt_tokens().unwrap_or(0);
        let completion = raw.completion_tokens().unwrap_or(0);
        let cache_creation = raw.cache_creation_tokens().unwrap_or(0);
        let mut cache_read = raw.cache_read_tokens().unwrap_or(0);

        if cache_read == 0
            && let Some((field, tokens)) = self.aliased_cache_read(raw)
        {
            tracing::debug!(field, tokens, "cache-read count taken from alias field");
            cache_read = tokens;
            corrections.push(Correction::CacheAlias {
                field: field.to_string(),
                tokens,
            });
        }

        if let Some(rule) = self.rules.prompt_corrections.iter().find(|r| r.matches(ctx)) {
            let added = cache_creation.saturating_add(cache_read);
            tracing::debug!(
                rule = %rule.name,
                api_base = ?ctx.api_base,
                provider_model = ?ctx.provider_model,
                raw_prompt = prompt,
                cache_creation,
                cache_read,
                "prompt correction rule matched"
            );
            if added > 0 {
                prompt = prompt.saturating_add(added);
                corrections.push(Correction::PromptIncludesCache {
                    rule: rule.name.clone(),
                    added,
                });
            }
        }

        if cache_read == 0
            && prompt > self.rules.cache_inference_threshold
            && model_name.is_some_and(|m| self.rules.cache_inference_models.iter().any(|x| x == m))
        {
            tracing::debug!(
                model = model_name.unwrap_or_default(),
                prompt,
                threshold = self.rules.cache_inference_threshold,
                "no cache-read count reported, treating prompt as cached"
            );
            cache_read = prompt;
            corrections.push(Correction::InferredCacheRead { tokens: prompt });
        }

        let usage = CanonicalUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            cache_read_tokens: cache_read,
            cache_creation_tokens: cache_creation,
            total_tokens: prompt.saturating_add(completion),
            prompt_tokens_details: PromptTokensDetails {
                cached_tokens: cache_read,
            },
        };
        (usage, corrections)
    }

    fn aliased_cache_read<'a>(&'a self, raw: &RawUsage) -> Option<(&'a str, i64)> {
        self.rules.cache_aliases.iter().find_map(|field| {
            raw.count(field)
                .filter(|&tokens| tokens > 0)
                .map(|tokens| (field.as_str(), tokens))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BEDROCK: &str = "https://bedrock-runtime.us-west-2.amazonaws.com";

    fn engine() -> UsageEngine {
        UsageEngine::default()
    }

    fn bedrock_claude() -> CallContext {
        CallContext::new(Some(BEDROCK), Some("bedrock/anthropic.claude-3-7-sonnet"))
    }

    #[test]
    fn plain_usage_is_identity() {
        let raw = RawUsage::from(json!({
            "prompt_tokens": 120,
            "completion_tokens": 30,
            "total_tokens": 150,
            "cache_read_input_tokens": 40,
            "cache_creation_input_tokens": 10
        }));
        let ctx = CallContext::new(Some("https://api.openai.com/v1"), Some("gpt-4o"));
        let (usage, corrections) = engine().normalize_traced(&raw, Some("gpt-4o"), &ctx);
        assert!(corrections.is_empty());
        assert_eq!(usage.prompt_tokens, 120);
        assert_eq!(usage.completion_tokens, 30);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(usage.cache_read_tokens, 40);
        assert_eq!(usage.cache_creation_tokens, 10);
        assert_eq!(usage.prompt_tokens_details.cached_tokens, 40);
    }

    #[test]
    fn empty_usage_defaults_to_zero() {
        let usage = engine().normalize(&RawUsage::default(), None, &CallContext::default());
        assert_eq!(usage, CanonicalUsage::default());
    }

    #[test]
    fn total_is_recomputed_from_parts() {
        let raw = RawUsage::new(10, 5).with_field("total_tokens", 999);
        let usage = engine().normalize(&raw, None, &CallContext::default());
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn cache_alias_fills_canonical_field() {
        let raw = RawUsage::default().with_field("cached_tokens", 42);
        let (usage, corrections) = engine().normalize_traced(&raw, None, &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 42);
        assert_eq!(usage.prompt_tokens_details.cached_tokens, 42);
        assert_eq!(
            corrections,
            vec![Correction::CacheAlias {
                field: "cached_tokens".to_string(),
                tokens: 42
            }]
        );
    }

    #[test]
    fn cache_alias_from_nested_details() {
        let raw = RawUsage::from(json!({
            "prompt_tokens": 500,
            "completion_tokens": 10,
            "prompt_tokens_details": {"cached_tokens": 256}
        }));
        let usage = engine().normalize(&raw, Some("gpt-4o"), &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 256);
        assert_eq!(usage.prompt_tokens, 500);
    }

    #[test]
    fn cache_alias_does_not_override_reported_count() {
        let raw = RawUsage::new(100, 1)
            .with_field("cache_read_input_tokens", 7)
            .with_field("cached_tokens", 42);
        let usage = engine().normalize(&raw, None, &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 7);
    }

    #[test]
    fn cache_alias_ignores_zero() {
        let raw = RawUsage::new(100, 1).with_field("cached_tokens", 0);
        let (usage, corrections) = engine().normalize_traced(&raw, None, &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 0);
        assert!(corrections.is_empty());
    }

    #[test]
    fn bedrock_claude_prompt_includes_cache_tokens() {
        let raw = RawUsage::new(100, 20)
            .with_field("cache_creation_input_tokens", 10)
            .with_field("cache_read_input_tokens", 5);
        let (usage, corrections) =
            engine().normalize_traced(&raw, Some("claude-sonnet"), &bedrock_claude());
        assert_eq!(usage.prompt_tokens, 115);
        assert_eq!(usage.total_tokens, 20 + 115);
        assert_eq!(usage.cache_read_tokens, 5);
        assert_eq!(usage.cache_creation_tokens, 10);
        assert_eq!(
            corrections,
            vec![Correction::PromptIncludesCache {
                rule: "bedrock-claude".to_string(),
                added: 15
            }]
        );
    }

    #[test]
    fn bedrock_claude_without_cache_tokens_records_nothing() {
        let raw = RawUsage::new(100, 20);
        let (usage, corrections) =
            engine().normalize_traced(&raw, Some("claude-sonnet"), &bedrock_claude());
        assert_eq!(usage.prompt_tokens, 100);
        assert_eq!(usage.total_tokens, 120);
        assert!(corrections.is_empty());
    }

    #[test]
    fn bedrock_endpoint_alone_is_not_enough() {
        let raw = RawUsage::new(100, 20).with_field("cache_read_input_tokens", 5);
        let ctx = CallContext::new(Some(BEDROCK), Some("bedrock/meta.llama3-70b"));
        let usage = engine().normalize(&raw, None, &ctx);
        assert_eq!(usage.prompt_tokens, 100);
    }

    #[test]
    fn claude_model_alone_is_not_enough() {
        let raw = RawUsage::new(100, 20).with_field("cache_read_input_tokens", 5);
        let ctx = CallContext::new(Some("https://api.anthropic.com"), Some("claude-3-7-sonnet"));
        let usage = engine().normalize(&raw, None, &ctx);
        assert_eq!(usage.prompt_tokens, 100);
    }

    #[test]
    fn model_marker_is_case_insensitive() {
        let ctx = CallContext::new(Some(BEDROCK), Some("us.anthropic.Claude-Opus"));
        assert!(NormalizationRules::default().prompt_corrections[0].matches(&ctx));
    }

    #[test]
    fn rule_with_empty_side_never_matches() {
        let rule = PromptCorrectionRule {
            name: "endpoint-only".to_string(),
            endpoint_contains: vec!["bedrock-runtime".to_string()],
            model_contains: Vec::new(),
        };
        assert!(!rule.matches(&bedrock_claude()));
    }

    #[test]
    fn alias_feeds_prompt_correction() {
        let raw = RawUsage::new(100, 0).with_field("cached_tokens", 8);
        let usage = engine().normalize(&raw, None, &bedrock_claude());
        assert_eq!(usage.cache_read_tokens, 8);
        assert_eq!(usage.prompt_tokens, 108);
    }

    #[test]
    fn inference_treats_large_prompt_as_cached() {
        let raw = RawUsage::new(1_000, 50);
        let (usage, corrections) =
            engine().normalize_traced(&raw, Some("kimi-k2-turbo-preview"), &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 1_000);
        assert_eq!(usage.prompt_tokens, 1_000);
        assert_eq!(usage.total_tokens, 1_050);
        assert_eq!(corrections, vec![Correction::InferredCacheRead { tokens: 1_000 }]);
    }

    #[test]
    fn inference_respects_threshold() {
        let at_threshold = RawUsage::new(100, 5);
        let usage = engine().normalize(
            &at_threshold,
            Some("kimi-k2-turbo-preview"),
            &CallContext::default(),
        );
        assert_eq!(usage.cache_read_tokens, 0);
    }

    #[test]
    fn inference_skipped_when_alias_reported() {
        let raw = RawUsage::new(1_000, 5).with_field("cached_tokens", 300);
        let (usage, corrections) =
            engine().normalize_traced(&raw, Some("kimi-k2-turbo-preview"), &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 300);
        assert_eq!(corrections.len(), 1);
    }

    #[test]
    fn inference_only_for_listed_models() {
        let raw = RawUsage::new(1_000, 5);
        let usage = engine().normalize(&raw, Some("kimi-k2"), &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 0);
        let usage = engine().normalize(&raw, None, &CallContext::default());
        assert_eq!(usage.cache_read_tokens, 0);
    }

    #[test]
    fn custom_rules_from_toml() {
        let rules: NormalizationRules = toml::from_str(
            r#"
            cache_aliases = ["usage_cache_hits"]
            cache_inference_models = []

            [[prompt_corrections]]
            name = "vertex-claude"
            endpoint_contains = ["aiplatform.googleapis.com"]
            model_contains = ["claude"]
            "#,
        )
        .unwrap();
        assert_eq!(rules.cache_inference_threshold, CACHE_INFERENCE_THRESHOLD);

        let engine = UsageEngine::new(rules);
        let raw = RawUsage::new(10, 1).with_field("usage_cache_hits", 4);
        let ctx = CallContext::new(
            Some("https://us-east5-aiplatform.googleapis.com"),
            Some("vertex_ai/claude-3-5-haiku"),
        );
        let usage = engine.normalize(&raw, None, &ctx);
        assert_eq!(usage.cache_read_tokens, 4);
        assert_eq!(usage.prompt_tokens, 14);
        // Default bedrock rule is replaced, not merged.
        assert!(engine.normalize(&raw, None, &bedrock_claude()).prompt_tokens == 10);
    }

    #[test]
    fn correction_labels() {
        let alias = Correction::CacheAlias {
            field: "cached_tokens".to_string(),
            tokens: 1,
        };
        assert_eq!(alias.to_string(), "alias:cached_tokens");
        assert_eq!(Correction::InferredCacheRead { tokens: 1 }.to_string(), "inferred-cache");
    }
}

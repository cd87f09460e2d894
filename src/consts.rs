/// Weight applied to deployments whose registry entry carries none
pub const DEFAULT_DEPLOYMENT_WEIGHT: u64 = 40;

/// Prompt size above which an unreported cache-read count is inferred
pub const CACHE_INFERENCE_THRESHOLD: i64 = 100;

/// Fallback value when a model name or id is unavailable
pub const UNKNOWN: &str = "unknown";

//! Session-sticky deployment routing and usage reconciliation for LLM gateways.
//!
//! - [`routing`]: weighted consistent-hash selection of one deployment per session.
//! - [`usage`]: normalization of provider usage reports into a canonical record.
//! - [`pricing`]: per-token pricing tables and deterministic cost computation.
//! - [`gateway`]: the pre-call and post-call boundaries over the gateway's JSON maps.
//!
//! Every operation is a pure function of its inputs and safe to call concurrently.

pub mod config;
pub mod consts;
pub mod error;
pub mod gateway;
pub mod pricing;
pub mod routing;
pub mod usage;

pub use config::Config;
pub use error::{AppError, PricingError, ReconcileError};
pub use gateway::{Reconciliation, apply_prompt_caching, filter_deployments, reconcile_call};
pub use pricing::{CostResult, PricingCatalog, PricingTable, compute_cost};
pub use routing::{Deployment, select};
pub use usage::{CallContext, CanonicalUsage, Correction, NormalizationRules, RawUsage, UsageEngine};

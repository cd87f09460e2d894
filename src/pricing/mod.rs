//! Pricing tables and cost computation
//!
//! Prices are supplied by the caller; nothing here fetches or edits them.

mod catalog;
mod cost;
mod resolver;
mod types;

pub use catalog::PricingCatalog;
pub use cost::{CostResult, compute_cost};
pub use resolver::resolve_pricing;
pub use types::PricingTable;

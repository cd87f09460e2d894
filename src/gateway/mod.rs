//! Gateway hook boundaries
//!
//! The gateway hands us loosely-typed JSON maps; these functions translate
//! them to the typed routing and usage layers and write results back.

mod post_call;
mod pre_call;

pub use post_call::{
    Reconciliation, apply_reconciliation, model_name, plan_reconciliation, reconcile_call,
};
pub use pre_call::{apply_prompt_caching, filter_deployments, session_id};

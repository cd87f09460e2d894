//! Session affinity routing

mod affinity;
mod deployment;
mod hash;

pub use affinity::{Selection, candidates, configured_shares, select, select_index};
pub use deployment::{Deployment, deployments_from_registry};
pub use hash::session_hash;

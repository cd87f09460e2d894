//! Weighted consistent-hash session affinity
//!
//! Candidates are sorted by deployment id and laid out as consecutive
//! ranges sized by their weight. A session hash reduced modulo the total
//! weight picks a point in that layout; the range containing it wins.
//! Sorting by id keeps the layout identical across calls and processes,
//! so a session stays on its deployment until the roster itself changes.

use super::deployment::Deployment;
use super::hash::session_hash;

/// Outcome of a routing decision over a deployment list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// No session or no deployments: the caller keeps its own choice
    Passthrough,
    /// No healthy deployment serves the requested model
    NoMatch,
    /// Index into the input slice of the selected deployment
    Selected(usize),
}

/// Zero weights still own a slot of size 1.
fn effective_weight(weight: u64) -> u128 {
    u128::from(weight.max(1))
}

/// Size of the selection range. Zero weights count as 1 here too, so a
/// zero-weight candidate at the end of the layout remains reachable.
/// With every weight at 0 this is the candidate count (uniform selection).
fn total_weight(weights: &[u64]) -> u128 {
    weights.iter().map(|&w| effective_weight(w)).sum()
}

/// Index of the first candidate whose cumulative weight exceeds `target`.
fn walk(target: u128, weights: &[u64]) -> usize {
    let mut cumulative = 0u128;
    for (index, &weight) in weights.iter().enumerate() {
        cumulative += effective_weight(weight);
        if target < cumulative {
            return index;
        }
    }
    0
}

/// Healthy deployments serving `model_name` with their index in
/// `deployments`, in layout order (sorted by deployment id).
pub fn candidates<'a>(model_name: &str, deployments: &'a [Deployment]) -> Vec<(usize, &'a Deployment)> {
    let mut found: Vec<(usize, &Deployment)> = deployments
        .iter()
        .enumerate()
        .filter(|(_, d)| d.healthy && d.model_name == model_name)
        .collect();
    found.sort_by(|(_, a), (_, b)| a.deployment_id.cmp(&b.deployment_id));
    found
}

/// Fraction of the selection range each candidate owns, in layout order.
///
/// Entries are `(index into deployments, share)`; shares sum to 1.
pub fn configured_shares(model_name: &str, deployments: &[Deployment]) -> Vec<(usize, f64)> {
    let found = candidates(model_name, deployments);
    let weights: Vec<u64> = found.iter().map(|(_, d)| d.weight).collect();
    let total = total_weight(&weights) as f64;
    found
        .iter()
        .zip(&weights)
        .map(|((index, _), &weight)| (*index, effective_weight(weight) as f64 / total))
        .collect()
}

/// Pick a deployment for `session_id`, returning its index in `deployments`.
pub fn select_index(
    session_id: Option<&str>,
    model_name: &str,
    deployments: &[Deployment],
) -> Selection {
    let Some(session_id) = session_id.filter(|s| !s.is_empty()) else {
        return Selection::Passthrough;
    };
    if deployments.is_empty() {
        return Selection::Passthrough;
    }

    let candidates = candidates(model_name, deployments);
    if candidates.is_empty() {
        tracing::debug!(model = model_name, offered = deployments.len(), "no deployment serves model");
        return Selection::NoMatch;
    }

    let weights: Vec<u64> = candidates.iter().map(|(_, d)| d.weight).collect();
    let total = total_weight(&weights);
    let target = session_hash(session_id) % total;
    let (index, chosen) = candidates[walk(target, &weights)];

    tracing::debug!(
        session_id,
        model = model_name,
        candidates = candidates.len(),
        total_weight = %total,
        point = %target,
        deployment_id = %chosen.deployment_id,
        "sticky deployment selected"
    );
    Selection::Selected(index)
}

/// Select the deployment for a session.
///
/// Returns `deployments` unchanged when there is no session or nothing to
/// choose from, an empty list when no healthy deployment serves
/// `model_name`, and otherwise exactly one deployment.
pub fn select(
    session_id: Option<&str>,
    model_name: &str,
    deployments: &[Deployment],
) -> Vec<Deployment> {
    match select_index(session_id, model_name, deployments) {
        Selection::Passthrough => deployments.to_vec(),
        Selection::NoMatch => Vec::new(),
        Selection::Selected(index) => vec![deployments[index].clone()],
    }
}

use std::sync::Arc;

use rand::RngCore;

use plexus_core::{Genome, Operator, WeightedOperator, weighted_pick};

/// Picks an operator applicable to `genome` under `scape_name` from a
/// weighted `mutationPolicy` (C5).
///
/// Filters to applicable candidates, then draws weighted by their
/// (non-negative) weight. If nothing passes and the default mutation is
/// applicable, falls back to it; otherwise falls back to the last-declared
/// policy entry, matching §4.4's explicit last-resort order.
pub fn choose_operator(
    policy: &[WeightedOperator],
    default_mutation: &Arc<dyn Operator>,
    genome: &Genome,
    scape_name: &str,
    rng: &mut dyn RngCore,
) -> Arc<dyn Operator> {
    let candidates: Vec<&WeightedOperator> = policy
        .iter()
        .filter(|w| w.weight > 0.0 && w.operator.applicable(genome, scape_name))
        .collect();

    if candidates.is_empty() {
        if default_mutation.applicable(genome, scape_name) {
            return Arc::clone(default_mutation);
        }
        if let Some(last) = policy.last() {
            return Arc::clone(&last.operator);
        }
        return Arc::clone(default_mutation);
    }

    let weights: Vec<f64> = candidates.iter().map(|w| w.weight).collect();
    let idx = weighted_pick(rng, &weights);
    Arc::clone(&candidates[idx].operator)
}

use rand::RngCore;

use plexus_core::{ScoredGenome, Select};

use crate::weighted_pick;

/// Weighted draw by fitness over `ranked[0..K)`, shifted so the minimum
/// weight is strictly positive (`shift = max(0, -min) + epsilon`). Unlike
/// [`crate::rank::RankSelector`], this uses the raw fitness magnitude rather
/// than rank order.
#[derive(Debug, Clone)]
pub struct TopKFitnessSelector {
    k: usize,
}

const EPSILON: f64 = 1e-9;

impl TopKFitnessSelector {
    pub fn new(k: usize) -> Self {
        TopKFitnessSelector { k: k.max(1) }
    }
}

impl Select for TopKFitnessSelector {
    fn name(&self) -> &str {
        "top_k_fitness"
    }

    fn pick<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        _elite_count: usize,
    ) -> &'a ScoredGenome {
        let k = self.k.min(ranked.len()).max(1);
        let pool = &ranked[..k];

        let min = pool.iter().map(|sg| sg.fitness).fold(f64::INFINITY, f64::min);
        let shift = (-min).max(0.0) + EPSILON;

        let weights: Vec<f64> = pool.iter().map(|sg| sg.fitness + shift).collect();
        let idx = weighted_pick(rng, &weights);
        &pool[idx]
    }
}

use rand::RngCore;

use plexus_core::{ScoredGenome, Select, default_pool_size};

use crate::weighted_pick;

/// Weighted draw over the bounded pool with linear-rank weights
/// `(poolSize, poolSize-1, ..., 1)` — the fittest member (index 0 of the
/// ranked pool) gets the heaviest weight without depending on the magnitude
/// of fitness values, only their order.
#[derive(Debug, Clone, Default)]
pub struct RankSelector {
    pool_size: Option<usize>,
}

impl RankSelector {
    pub fn new() -> Self {
        RankSelector::default()
    }

    pub fn with_pool(pool_size: usize) -> Self {
        RankSelector {
            pool_size: Some(pool_size),
        }
    }
}

impl Select for RankSelector {
    fn name(&self) -> &str {
        "rank"
    }

    fn pick<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
    ) -> &'a ScoredGenome {
        let pool_size = self
            .pool_size
            .unwrap_or_else(|| default_pool_size(ranked.len(), elite_count))
            .min(ranked.len())
            .max(1);

        let weights: Vec<f64> = (0..pool_size).map(|i| (pool_size - i) as f64).collect();
        let idx = weighted_pick(rng, &weights);
        &ranked[idx]
    }
}

use rand::Rng;
use rand::RngCore;

use plexus_core::{ScoredGenome, Select, default_pool_size};

use crate::weighted_pick;

/// Weighted draw over the bounded pool where weight is
/// `fitness / (|neurons| + |synapses|)`, clamped to `>= 0`. Rewards compact
/// genomes that still perform well, not raw fitness alone.
///
/// Falls back to a uniform draw when every candidate's weight is zero (e.g.
/// all fitnesses are non-positive).
#[derive(Debug, Clone, Default)]
pub struct EfficiencySelector {
    pool_size: Option<usize>,
}

impl EfficiencySelector {
    pub fn new() -> Self {
        EfficiencySelector::default()
    }

    pub fn with_pool(pool_size: usize) -> Self {
        EfficiencySelector {
            pool_size: Some(pool_size),
        }
    }
}

impl Select for EfficiencySelector {
    fn name(&self) -> &str {
        "efficiency"
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

        let weights: Vec<f64> = ranked[..pool_size]
            .iter()
            .map(|sg| {
                let size = (sg.genome.neurons.len() + sg.genome.synapses.len()) as f64;
                if size <= 0.0 {
                    0.0
                } else {
                    (sg.fitness / size).max(0.0)
                }
            })
            .collect();

        if weights.iter().sum::<f64>() <= 0.0 {
            let idx = rng.random_range(0..pool_size);
            return &ranked[idx];
        }

        let idx = weighted_pick(rng, &weights);
        &ranked[idx]
    }
}

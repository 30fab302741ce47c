use rand::Rng;
use rand::RngCore;

use plexus_core::{ScoredGenome, Select, default_pool_size};

/// Uniform draw over the bounded pool, ignoring fitness entirely.
#[derive(Debug, Clone, Default)]
pub struct RandomSelector {
    pool_size: Option<usize>,
}

impl RandomSelector {
    pub fn new() -> Self {
        RandomSelector::default()
    }

    pub fn with_pool(pool_size: usize) -> Self {
        RandomSelector {
            pool_size: Some(pool_size),
        }
    }
}

impl Select for RandomSelector {
    fn name(&self) -> &str {
        "random"
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
        let idx = rng.random_range(0..pool_size);
        &ranked[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use plexus_core::genome::{Genome, Trace};

    fn scored(id: &str, fitness: f64) -> ScoredGenome {
        ScoredGenome::new(Genome::new(id), fitness, Trace::empty())
    }

    #[test]
    fn stays_within_bounded_pool() {
        let ranked = vec![scored("a", 9.0), scored("b", 1.0), scored("c", 0.0)];
        let mut rng = SmallRng::seed_from_u64(1);
        let selector = RandomSelector::with_pool(2);
        for _ in 0..50 {
            let picked = selector.pick(&mut rng, &ranked, 1);
            assert_ne!(picked.genome.id, "c");
        }
    }
}

use rand::Rng;
use rand::RngCore;

use plexus_core::{ScoredGenome, Select, default_pool_size};

/// Samples `tournament_size` indices uniformly from the bounded pool and
/// returns the fittest pick.
///
/// `pool_size` and `tournament_size` default per §4.3 when unset at
/// construction: `pool_size = 2*eliteCount` clamped to
/// `[eliteCount, len(ranked)]`; `tournament_size = 3` clamped to `pool_size`.
#[derive(Debug, Clone, Default)]
pub struct TournamentSelector {
    pool_size: Option<usize>,
    tournament_size: Option<usize>,
}

impl TournamentSelector {
    pub fn new() -> Self {
        TournamentSelector::default()
    }

    pub fn with_tournament_size(tournament_size: usize) -> Self {
        TournamentSelector {
            pool_size: None,
            tournament_size: Some(tournament_size),
        }
    }

    pub fn with_pool(pool_size: usize, tournament_size: usize) -> Self {
        TournamentSelector {
            pool_size: Some(pool_size),
            tournament_size: Some(tournament_size),
        }
    }
}

impl Select for TournamentSelector {
    fn name(&self) -> &str {
        "tournament"
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
        let tournament_size = self.tournament_size.unwrap_or(3).min(pool_size).max(1);

        let mut best_idx = rng.random_range(0..pool_size);
        for _ in 1..tournament_size {
            let candidate = rng.random_range(0..pool_size);
            if ranked[candidate].fitness > ranked[best_idx].fitness {
                best_idx = candidate;
            }
        }
        &ranked[best_idx]
    }
}

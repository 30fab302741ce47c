use std::collections::HashMap;

use rand::RngCore;

use crate::genome::ScoredGenome;
use crate::species::SpeciesKey;

/// Chooses a parent genome from a ranked (fitness-descending) pool.
///
/// Capability upgrades cascade as default methods, mirroring how mutation
/// operators cascade population -> genotype -> gene: a selector overrides
/// only the most specific method it needs; everything else falls through to
/// a simpler variant. The scheduler always calls
/// [`Select::pick_for_generation_with_species`]; plain selectors simply never
/// override it and the default chain collapses to [`Select::pick`].
pub trait Select: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("Select")
    }

    fn pick<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
    ) -> &'a ScoredGenome;

    fn pick_for_generation<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
        _generation: usize,
    ) -> &'a ScoredGenome {
        self.pick(rng, ranked, elite_count)
    }

    fn pick_for_generation_with_species<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
        generation: usize,
        _species_by_genome_id: &HashMap<String, SpeciesKey>,
    ) -> &'a ScoredGenome {
        self.pick_for_generation(rng, ranked, elite_count, generation)
    }
}

/// Clamps `value` into `[lo, hi]`, matching the bounded-pool clamps used
/// throughout the concrete selectors (`poolSize`, `tournamentSize`, ...).
pub fn clamp(value: usize, lo: usize, hi: usize) -> usize {
    value.max(lo).min(hi.max(lo))
}

/// The default bounded-pool size shared by every selector in §4.3 that reads
/// from "the bounded pool" rather than the full ranking: `2*eliteCount`,
/// clamped to `[eliteCount, ranked_len]`.
pub fn default_pool_size(ranked_len: usize, elite_count: usize) -> usize {
    clamp(elite_count.saturating_mul(2), elite_count, ranked_len)
}

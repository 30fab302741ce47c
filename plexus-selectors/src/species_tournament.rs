use std::collections::HashMap;
use std::sync::Arc;

use rand::RngCore;

use plexus_core::{ScoredGenome, Select, SpeciesIdentifier, SpeciesKey, identifier_by_name};

use crate::species_common::SpeciesBucketedTournament;

/// Species-aware tournament: draws a species weighted by its raw mean
/// fitness (shift-positive), then runs a tournament inside that species.
/// Optionally drops species that have not improved in more than
/// `stagnation_generations` generations.
pub struct SpeciesTournamentSelector {
    inner: SpeciesBucketedTournament,
}

impl SpeciesTournamentSelector {
    pub fn new(identifier_name: &str) -> Result<Self, plexus_error::PlexusError> {
        Ok(Self::with_identifier(identifier_by_name(identifier_name)?))
    }

    pub fn with_identifier(identifier: Arc<dyn SpeciesIdentifier>) -> Self {
        SpeciesTournamentSelector {
            inner: SpeciesBucketedTournament::new(None, None, None, false, identifier),
        }
    }

    pub fn with_pool(mut self, pool_size: usize) -> Self {
        self.inner = self.inner.with_pool_size(pool_size);
        self
    }

    pub fn with_tournament_size(mut self, tournament_size: usize) -> Self {
        self.inner = self.inner.with_tournament_size(tournament_size);
        self
    }

    pub fn with_stagnation(mut self, stagnation_generations: usize) -> Self {
        self.inner = self.inner.with_stagnation_generations(stagnation_generations);
        self
    }
}

impl Select for SpeciesTournamentSelector {
    fn name(&self) -> &str {
        "species_tournament"
    }

    fn pick<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
    ) -> &'a ScoredGenome {
        self.inner.pick_without_species(rng, ranked, elite_count)
    }

    fn pick_for_generation_with_species<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
        generation: usize,
        species_by_genome_id: &HashMap<String, SpeciesKey>,
    ) -> &'a ScoredGenome {
        self.inner
            .pick_with_species(rng, ranked, elite_count, generation, species_by_genome_id)
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
    fn stagnant_species_excluded_after_cap() {
        let selector = SpeciesTournamentSelector::new("topology")
            .unwrap()
            .with_pool(4)
            .with_tournament_size(1)
            .with_stagnation(3);

        let mut species_map = HashMap::new();
        species_map.insert("x1".to_string(), SpeciesKey("sp-x".into()));
        species_map.insert("x2".to_string(), SpeciesKey("sp-x".into()));
        species_map.insert("y1".to_string(), SpeciesKey("sp-y".into()));
        species_map.insert("y2".to_string(), SpeciesKey("sp-y".into()));

        let ranked = vec![
            scored("x1", 5.0),
            scored("x2", 4.0),
            scored("y1", 1.0),
            scored("y2", 0.5),
        ];
        let mut rng = SmallRng::seed_from_u64(1);

        // Generations 0..=3: species X's best fitness never changes (5.0),
        // so by generation 4 it has gone unimproved for > 3 generations.
        for generation in 0..4 {
            let _ = selector.pick_for_generation_with_species(
                &mut rng,
                &ranked,
                1,
                generation,
                &species_map,
            );
        }

        // At generation 5, species X should be excluded: every draw must
        // land in species Y.
        for _ in 0..50 {
            let picked =
                selector.pick_for_generation_with_species(&mut rng, &ranked, 1, 5, &species_map);
            assert!(picked.genome.id == "y1" || picked.genome.id == "y2");
        }
    }
}

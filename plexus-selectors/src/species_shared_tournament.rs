use std::collections::HashMap;
use std::sync::Arc;

use rand::RngCore;

use plexus_core::{ScoredGenome, Select, SpeciesIdentifier, SpeciesKey, identifier_by_name};

use crate::species_common::SpeciesBucketedTournament;

/// Like [`crate::species_tournament::SpeciesTournamentSelector`], but weights
/// species by explicitly-shared mean fitness (`mean / species_size`) rather
/// than raw mean fitness — larger species are discounted, matching classic
/// NEAT explicit fitness sharing.
pub struct SpeciesSharedTournamentSelector {
    inner: SpeciesBucketedTournament,
}

impl SpeciesSharedTournamentSelector {
    pub fn new(identifier_name: &str) -> Result<Self, plexus_error::PlexusError> {
        Ok(Self::with_identifier(identifier_by_name(identifier_name)?))
    }

    pub fn with_identifier(identifier: Arc<dyn SpeciesIdentifier>) -> Self {
        SpeciesSharedTournamentSelector {
            inner: SpeciesBucketedTournament::new(None, None, None, true, identifier),
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

impl Select for SpeciesSharedTournamentSelector {
    fn name(&self) -> &str {
        "species_shared_tournament"
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

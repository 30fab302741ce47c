use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use rand::Rng;
use rand::RngCore;

use plexus_core::{ScoredGenome, Select, SpeciesIdentifier, SpeciesKey, default_pool_size};

use crate::weighted_pick;

const EPSILON: f64 = 1e-9;

struct Stagnation {
    best_fitness: f64,
    last_improved_generation: usize,
}

/// Shared machinery behind [`crate::species_tournament::SpeciesTournamentSelector`]
/// and [`crate::species_shared_tournament::SpeciesSharedTournamentSelector`]:
/// pool the top `pool_size` ranked genomes, bucket them by species key,
/// optionally drop species that have not improved their best fitness in more
/// than `stagnation_generations`, weight the remaining species by (shared or
/// raw) mean fitness shift-positive, draw a species, then run a tournament
/// inside it.
pub(crate) struct SpeciesBucketedTournament {
    pool_size: Option<usize>,
    tournament_size: Option<usize>,
    stagnation_generations: Option<usize>,
    shared: bool,
    identifier: Arc<dyn SpeciesIdentifier>,
    stagnation: Mutex<HashMap<SpeciesKey, Stagnation>>,
}

impl SpeciesBucketedTournament {
    pub(crate) fn new(
        pool_size: Option<usize>,
        tournament_size: Option<usize>,
        stagnation_generations: Option<usize>,
        shared: bool,
        identifier: Arc<dyn SpeciesIdentifier>,
    ) -> Self {
        SpeciesBucketedTournament {
            pool_size,
            tournament_size,
            stagnation_generations,
            shared,
            identifier,
            stagnation: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    pub(crate) fn with_tournament_size(mut self, tournament_size: usize) -> Self {
        self.tournament_size = Some(tournament_size);
        self
    }

    pub(crate) fn with_stagnation_generations(mut self, stagnation_generations: usize) -> Self {
        self.stagnation_generations = Some(stagnation_generations);
        self
    }

    fn bounded_pool_size(&self, ranked_len: usize, elite_count: usize) -> usize {
        self.pool_size
            .unwrap_or_else(|| default_pool_size(ranked_len, elite_count))
            .min(ranked_len)
            .max(1)
    }

    fn tournament_within<'a>(
        &self,
        rng: &mut dyn RngCore,
        pool: &'a [ScoredGenome],
        bucket: &[usize],
    ) -> &'a ScoredGenome {
        let tournament_size = self
            .tournament_size
            .unwrap_or(3)
            .min(bucket.len())
            .max(1);

        let mut best = bucket[rng.random_range(0..bucket.len())];
        for _ in 1..tournament_size {
            let candidate = bucket[rng.random_range(0..bucket.len())];
            if pool[candidate].fitness > pool[best].fitness {
                best = candidate;
            }
        }
        &pool[best]
    }

    /// Plain fallback when no species information is available at all: a
    /// bounded-pool tournament over the whole pool, ignoring species.
    pub(crate) fn pick_without_species<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
    ) -> &'a ScoredGenome {
        let pool_size = self.bounded_pool_size(ranked.len(), elite_count);
        let indices: Vec<usize> = (0..pool_size).collect();
        self.tournament_within(rng, ranked, &indices)
    }

    pub(crate) fn pick_with_species<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
        generation: usize,
        species_by_genome_id: &HashMap<String, SpeciesKey>,
    ) -> &'a ScoredGenome {
        let pool_size = self.bounded_pool_size(ranked.len(), elite_count);
        let pool = &ranked[..pool_size];

        let mut buckets: HashMap<SpeciesKey, Vec<usize>> = HashMap::new();
        for (idx, sg) in pool.iter().enumerate() {
            let key = species_by_genome_id
                .get(&sg.genome.id)
                .cloned()
                .unwrap_or_else(|| SpeciesKey(self.identifier.identify(&sg.genome)));
            buckets.entry(key).or_default().push(idx);
        }

        if buckets.is_empty() {
            return self.pick_without_species(rng, ranked, elite_count);
        }

        let mut per_species_best: HashMap<SpeciesKey, f64> = HashMap::new();
        for (key, members) in &buckets {
            let best = members
                .iter()
                .map(|&i| pool[i].fitness)
                .fold(f64::NEG_INFINITY, f64::max);
            per_species_best.insert(key.clone(), best);
        }

        let mut stagnation = self.stagnation.lock().unwrap();
        for (key, best) in &per_species_best {
            let entry = stagnation.entry(key.clone()).or_insert(Stagnation {
                best_fitness: *best,
                last_improved_generation: generation,
            });
            if *best > entry.best_fitness {
                entry.best_fitness = *best;
                entry.last_improved_generation = generation;
            }
        }

        let mut keys: Vec<&SpeciesKey> = buckets.keys().collect();
        keys.sort();

        let active: Vec<&SpeciesKey> = match self.stagnation_generations {
            Some(cap) => {
                let filtered: Vec<&SpeciesKey> = keys
                    .iter()
                    .copied()
                    .filter(|key| {
                        let last = stagnation
                            .get(*key)
                            .map(|s| s.last_improved_generation)
                            .unwrap_or(generation);
                        generation.saturating_sub(last) <= cap
                    })
                    .collect();
                if filtered.is_empty() { keys.clone() } else { filtered }
            }
            None => keys.clone(),
        };
        drop(stagnation);

        let means: Vec<f64> = active
            .iter()
            .map(|key| {
                let members = &buckets[*key];
                let sum: f64 = members.iter().map(|&i| pool[i].fitness).sum();
                let mean = sum / members.len() as f64;
                if self.shared { mean / members.len() as f64 } else { mean }
            })
            .collect();

        let min = means.iter().copied().fold(f64::INFINITY, f64::min);
        let shift = (-min).max(0.0) + EPSILON;
        let weights: Vec<f64> = means.iter().map(|m| m + shift).collect();

        let species_idx = weighted_pick(rng, &weights);
        let chosen_key = active[species_idx];
        let bucket = &buckets[chosen_key];

        self.tournament_within(rng, pool, bucket)
    }
}

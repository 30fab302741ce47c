use std::collections::{BTreeMap, BTreeSet, HashMap};

use plexus_core::genome::{Genome, ScoredGenome};
use plexus_core::signature::distance;
use plexus_core::species::{SpeciationState, SpeciesKey};

/// The outcome of assigning one generation's population to species (C2).
pub struct SpeciesAssignment {
    /// Species key for every genome, keyed by genome ID.
    pub by_genome_id: HashMap<String, SpeciesKey>,
    /// Indices into the input slice, grouped by species key, in key order.
    pub members: BTreeMap<SpeciesKey, Vec<usize>>,
    pub new_species: Vec<SpeciesKey>,
    pub extinct_species: Vec<SpeciesKey>,
}

/// Assigns every genome in `genomes` to a species key using `state`'s
/// representatives, mints new keys as needed, nudges `state.threshold`
/// toward the target species count, and replaces every active species'
/// representative with its medoid.
///
/// Input is processed in an identifier-sorted order internally (§4.2 step 1)
/// so the result is deterministic regardless of the caller's ordering; the
/// returned indices refer back to `genomes` as passed in.
pub fn assign(state: &mut SpeciationState, genomes: &[ScoredGenome]) -> SpeciesAssignment {
    let existing_keys_before: BTreeSet<SpeciesKey> = state.representatives.keys().cloned().collect();

    let mut order: Vec<usize> = (0..genomes.len()).collect();
    order.sort_by(|&a, &b| genomes[a].genome.id.cmp(&genomes[b].genome.id));

    // Representatives as of the start of this generation, augmented with
    // newly-minted founders as the pass proceeds so later genomes in the
    // same generation can join a species founded earlier in the pass.
    let mut live_representatives: BTreeMap<SpeciesKey, Genome> = state.representatives.clone();
    let mut by_genome_id: HashMap<String, SpeciesKey> = HashMap::new();
    let mut members: BTreeMap<SpeciesKey, Vec<usize>> = BTreeMap::new();

    for &idx in &order {
        let genome = &genomes[idx].genome;

        let best = live_representatives
            .iter()
            .map(|(key, rep)| (key.clone(), distance(genome, rep)))
            .fold(None, |acc: Option<(SpeciesKey, f64)>, (key, dist)| match acc {
                Some((best_key, best_dist)) if best_dist <= dist => Some((best_key, best_dist)),
                _ => Some((key, dist)),
            });

        let key = match best {
            Some((key, dist)) if dist <= state.threshold => key,
            _ => {
                let key = state.mint_key();
                live_representatives.insert(key.clone(), genome.clone());
                key
            }
        };

        by_genome_id.insert(genome.id.clone(), key.clone());
        members.entry(key).or_default().push(idx);
    }

    state.adjust_threshold(members.len());

    let mut new_representatives: BTreeMap<SpeciesKey, Genome> = BTreeMap::new();
    for (key, indices) in &members {
        new_representatives.insert(key.clone(), medoid(genomes, indices));
    }

    let after_keys: BTreeSet<SpeciesKey> = new_representatives.keys().cloned().collect();
    let new_species: Vec<SpeciesKey> = after_keys.difference(&existing_keys_before).cloned().collect();
    let extinct_species: Vec<SpeciesKey> = existing_keys_before.difference(&after_keys).cloned().collect();

    state.representatives = new_representatives;

    SpeciesAssignment {
        by_genome_id,
        members,
        new_species,
        extinct_species,
    }
}

/// The member of `genomes[indices]` minimizing total distance to all other
/// members of the same group — O(N^2) per species as documented in §9.
fn medoid(genomes: &[ScoredGenome], indices: &[usize]) -> Genome {
    if indices.len() == 1 {
        return genomes[indices[0]].genome.clone();
    }

    let mut best_idx = indices[0];
    let mut best_total = f64::INFINITY;

    for &candidate in indices {
        let total: f64 = indices
            .iter()
            .filter(|&&other| other != candidate)
            .map(|&other| distance(&genomes[candidate].genome, &genomes[other].genome))
            .sum();
        if total < best_total {
            best_total = total;
            best_idx = candidate;
        }
    }

    genomes[best_idx].genome.clone()
}

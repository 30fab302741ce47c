use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::RngCore;

use plexus_core::config::MonitorConfig;
use plexus_core::ctx::RunContext;
use plexus_core::genome::{Genome, ScoredGenome, Trace};
use plexus_core::lineage::LineageRecord;
use plexus_core::signature::signature;
use plexus_core::species::SpeciesKey;
use plexus_error::{PlexusError, PlexusResult};

use crate::chooser::choose_operator;

/// The result of producing one generation's population (C7).
pub struct OffspringOutcome {
    pub population: Vec<Genome>,
    pub lineage: Vec<LineageRecord>,
}

fn unknown_species_key() -> SpeciesKey {
    SpeciesKey("species:unknown".to_string())
}

fn species_key_of(genome_id: &str, species_by_genome_id: &HashMap<String, SpeciesKey>) -> SpeciesKey {
    species_by_genome_id
        .get(genome_id)
        .cloned()
        .unwrap_or_else(unknown_species_key)
}

/// Step 1: walks `ranked` in order (already fitness-descending), retaining at
/// most `specie_size_limit` members per species key. Falls back to the full
/// ranking if the cap empties the pool or is disabled (`0`).
fn capped_parent_pool<'a>(
    ranked: &'a [ScoredGenome],
    species_by_genome_id: &HashMap<String, SpeciesKey>,
    specie_size_limit: usize,
) -> Vec<&'a ScoredGenome> {
    if specie_size_limit == 0 {
        return ranked.iter().collect();
    }

    let mut counts: HashMap<SpeciesKey, usize> = HashMap::new();
    let mut capped = Vec::new();
    for sg in ranked {
        let key = species_key_of(&sg.genome.id, species_by_genome_id);
        let count = counts.entry(key).or_insert(0);
        if *count < specie_size_limit {
            capped.push(sg);
            *count += 1;
        }
    }

    if capped.is_empty() { ranked.iter().collect() } else { capped }
}

fn group_by_species<'a>(
    capped: &[&'a ScoredGenome],
    species_by_genome_id: &HashMap<String, SpeciesKey>,
) -> BTreeMap<SpeciesKey, Vec<&'a ScoredGenome>> {
    let mut groups: BTreeMap<SpeciesKey, Vec<&ScoredGenome>> = BTreeMap::new();
    for &sg in capped {
        let key = species_key_of(&sg.genome.id, species_by_genome_id);
        groups.entry(key).or_default().push(sg);
    }
    groups
}

/// Step 3: largest-remainder (Hamilton) apportionment of `remaining` slots
/// across species means, shifted positive and ties broken by ascending key.
fn offspring_quotas(
    groups: &BTreeMap<SpeciesKey, Vec<&ScoredGenome>>,
    remaining: usize,
) -> BTreeMap<SpeciesKey, usize> {
    if groups.is_empty() || remaining == 0 {
        return BTreeMap::new();
    }

    let means: BTreeMap<SpeciesKey, f64> = groups
        .iter()
        .map(|(key, members)| {
            let mean = members.iter().map(|sg| sg.fitness).sum::<f64>() / members.len() as f64;
            (key.clone(), mean)
        })
        .collect();

    let min_mean = means.values().cloned().fold(f64::INFINITY, f64::min);
    let shift = (-min_mean).max(0.0) + 1e-9;
    let shifted: BTreeMap<SpeciesKey, f64> = means.iter().map(|(k, m)| (k.clone(), m + shift)).collect();

    let mut total: f64 = shifted.values().sum();
    let equal_weight = !(total.is_finite() && total > 0.0);
    if equal_weight {
        total = shifted.len() as f64;
    }

    let mut floors: BTreeMap<SpeciesKey, usize> = BTreeMap::new();
    let mut fractions: Vec<(SpeciesKey, f64)> = Vec::with_capacity(shifted.len());
    let mut assigned = 0usize;

    for (key, mean) in &shifted {
        let share = if equal_weight { 1.0 / total } else { mean / total };
        let exact = share * remaining as f64;
        let floor = exact.floor().max(0.0) as usize;
        floors.insert(key.clone(), floor);
        assigned += floor;
        fractions.push((key.clone(), exact - floor as f64));
    }

    let mut leftover = remaining.saturating_sub(assigned);
    fractions.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    for (key, _) in fractions {
        if leftover == 0 {
            break;
        }
        *floors.get_mut(&key).unwrap() += 1;
        leftover -= 1;
    }

    floors
}

/// Produces one child by cloning `parent` under a fresh ID and applying
/// `mutationCount` operators in sequence, retrying sentinel "no-target"
/// failures with a different operator and falling back to the default
/// mutation on any other failure (§4.6).
fn produce_child(
    config: &MonitorConfig,
    parent: &ScoredGenome,
    generation: usize,
    slot: &mut usize,
    rng: &mut dyn RngCore,
) -> PlexusResult<(Genome, LineageRecord)> {
    let next_gen = generation + 1;
    let child_id = format!("{}-g{}-i{}", parent.genome.id, next_gen, slot);
    *slot += 1;

    let mutation_count = config.topological_mutations.count(parent.genome.neurons.len(), rng);
    let budget = mutation_count * (4 + 4 * config.mutation_policy.len());

    let mut current = parent.genome.clone();
    current.id = child_id.clone();

    let mut op_names = Vec::with_capacity(mutation_count);
    let mut attempted = 0usize;

    for _ in 0..mutation_count {
        loop {
            if attempted >= budget {
                return Err(PlexusError::MutationExhaustion { attempted, budget });
            }
            attempted += 1;

            let op = choose_operator(
                &config.mutation_policy,
                &config.mutation,
                &current,
                config.scape.name(),
                rng,
            );

            match op.apply(&current) {
                Ok(mut next) => {
                    next.id = child_id.clone();
                    current = next;
                    op_names.push(op.name().to_string());
                    break;
                }
                Err(err) if err.is_mutation_sentinel() => continue,
                Err(err) => {
                    if Arc::ptr_eq(&op, &config.mutation) {
                        return Err(err);
                    }
                    match config.mutation.apply(&current) {
                        Ok(mut next) => {
                            next.id = child_id.clone();
                            current = next;
                            op_names.push(format!("{}(fallback)", config.mutation.name()));
                            break;
                        }
                        Err(_) => return Err(err),
                    }
                }
            }
        }
    }

    let sig = signature(&current);
    let record = LineageRecord::new(
        child_id,
        Some(parent.genome.id.clone()),
        next_gen,
        op_names.join("+"),
        &sig,
    );
    Ok((current, record))
}

fn clone_elites(ranked: &[ScoredGenome], elite_count: usize, generation: usize) -> (Vec<Genome>, Vec<LineageRecord>) {
    let next_gen = generation + 1;
    let mut population = Vec::with_capacity(elite_count);
    let mut lineage = Vec::with_capacity(elite_count);

    for sg in ranked.iter().take(elite_count) {
        let clone = sg.genome.clone();
        let sig = signature(&clone);
        lineage.push(LineageRecord::new(
            clone.id.clone(),
            Some(clone.id.clone()),
            next_gen,
            "elite_clone",
            &sig,
        ));
        population.push(clone);
    }

    (population, lineage)
}

/// Produces generation `generation + 1`'s population from `ranked` (§4.6).
pub fn next_generation(
    ctx: &RunContext,
    config: &MonitorConfig,
    ranked: &[ScoredGenome],
    species_by_genome_id: &HashMap<String, SpeciesKey>,
    generation: usize,
    rng: &mut dyn RngCore,
) -> PlexusResult<OffspringOutcome> {
    ctx.check()?;

    let (mut population, mut lineage) = clone_elites(ranked, config.elite_count, generation);
    let remaining = config.population_size.saturating_sub(config.elite_count);
    let mut slot = 0usize;

    if remaining > 0 {
        let capped = capped_parent_pool(ranked, species_by_genome_id, config.specie_size_limit);
        let groups = group_by_species(&capped, species_by_genome_id);
        let quotas = offspring_quotas(&groups, remaining);

        for (key, count) in &quotas {
            if *count == 0 {
                continue;
            }
            let members = groups.get(key).expect("quota key drawn from groups");
            let proxy: Vec<ScoredGenome> = members
                .iter()
                .map(|sg| ScoredGenome::new(sg.genome.clone(), sg.fitness, Trace::empty()))
                .collect();

            for _ in 0..*count {
                ctx.check()?;
                let parent = config.selector.pick_for_generation_with_species(
                    rng,
                    &proxy,
                    config.elite_count,
                    generation,
                    species_by_genome_id,
                );
                let (child, record) = produce_child(config, parent, generation, &mut slot, rng)?;
                population.push(child);
                lineage.push(record);
            }
        }
    }

    // Underfill is rare — quotas are constructed to sum to `remaining` exactly
    // — but the documented fallback is to draw from the unfiltered pool.
    while population.len() < config.population_size {
        ctx.check()?;
        let parent = config.selector.pick_for_generation(rng, ranked, config.elite_count, generation);
        let (child, record) = produce_child(config, parent, generation, &mut slot, rng)?;
        population.push(child);
        lineage.push(record);
    }

    Ok(OffspringOutcome { population, lineage })
}

//! End-to-end scenario checks driven through the public crate surface
//! (`plexus_engines::run`/`next_generation`, `plexus_selectors`), one per
//! concrete scenario. These complement the narrower in-file unit tests in
//! `evaluator.rs`/`offspring.rs`/`scheduler.rs`, which cover the same ground
//! at each module's own seam rather than through the whole pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use plexus_core::ctx::RunContext;
use plexus_core::genome::{Genome, ScoredGenome, Trace};
use plexus_core::operator::{Operator, WeightedOperator};
use plexus_core::rate::MutationCountPolicy;
use plexus_core::scape::{Cortex, CortexBuilder, Scape};
use plexus_core::selector::Select;
use plexus_core::species::SpeciesKey;
use plexus_core::MonitorConfig;
use plexus_error::{PlexusError, SentinelKind};
use plexus_engines::{next_generation, run};
use plexus_selectors::species_shared_tournament::SpeciesSharedTournamentSelector;

struct NoopOperator;
impl Operator for NoopOperator {
    fn name(&self) -> &str {
        "noop"
    }
    fn apply(&self, genome: &Genome) -> plexus_error::PlexusResult<Genome> {
        Ok(genome.clone())
    }
}

struct LinearScape;
impl Scape for LinearScape {
    fn name(&self) -> &str {
        "linear"
    }
    fn evaluate(&self, _ctx: &RunContext, cortex: &Cortex) -> plexus_error::PlexusResult<(f64, Trace)> {
        let fitness: &f64 = cortex.downcast_ref().unwrap();
        Ok((*fitness, Trace::empty()))
    }
}

struct FitnessCortexBuilder;
impl CortexBuilder for FitnessCortexBuilder {
    fn build(&self, genome: &Genome, _scape_name: &str) -> plexus_error::PlexusResult<Cortex> {
        let tag: f64 = genome.id.trim_start_matches("g-").parse().unwrap_or(0.0);
        Ok(Cortex::new(tag))
    }
}

struct FirstSelect;
impl Select for FirstSelect {
    fn pick<'a>(
        &self,
        _rng: &mut dyn rand::RngCore,
        ranked: &'a [ScoredGenome],
        _elite_count: usize,
    ) -> &'a ScoredGenome {
        &ranked[0]
    }
}

fn seeded_population(fitnesses: &[f64]) -> Vec<Genome> {
    fitnesses.iter().map(|f| Genome::new(format!("g-{f}"))).collect()
}

/// S1: a trivial 4-genome, 1-worker, 1-generation run with a const(3) noop
/// mutation policy. Three "noop+noop+noop" offspring, one elite clone, and a
/// final best fitness matching the highest input.
#[test]
fn s1_trivial_run() {
    let config = Arc::new(
        MonitorConfig::builder()
            .scape(Arc::new(LinearScape))
            .cortex_builder(Arc::new(FitnessCortexBuilder))
            .mutation(Arc::new(NoopOperator))
            .mutation_policy(vec![WeightedOperator::new(Arc::new(NoopOperator), 1.0)])
            .selector(Arc::new(FirstSelect))
            .topological_mutations(MutationCountPolicy::Const(3))
            .population_size(4)
            .elite_count(1)
            .generations(1)
            .workers(1)
            .input_neuron_ids(vec!["in-0".into()])
            .output_neuron_ids(vec!["out-0".into()])
            .build()
            .unwrap(),
    );

    let population = seeded_population(&[-1.0, -0.8, -0.6, -0.4]);
    let outcome = run(config, RunContext::new(), population).unwrap();

    assert_eq!(outcome.best_by_generation, vec![-0.4]);

    let elite_clones = outcome.lineage.iter().filter(|r| r.operation == "elite_clone").count();
    assert_eq!(elite_clones, 1);

    let noop_chains = outcome
        .lineage
        .iter()
        .filter(|r| r.operation == "noop+noop+noop")
        .count();
    assert_eq!(noop_chains, 3);
}

/// S2: 10 genomes split into species A (size 6, mean 1.0) and B (size 4,
/// mean 2.0); 7 offspring slots split 2/5 by largest-remainder apportionment.
/// Checked end-to-end through `next_generation` rather than the internal
/// `offspring_quotas` helper, by counting each child's parent species.
#[test]
fn s2_apportionment_end_to_end() {
    let config = MonitorConfig::builder()
        .scape(Arc::new(LinearScape))
        .cortex_builder(Arc::new(FitnessCortexBuilder))
        .mutation(Arc::new(NoopOperator))
        .mutation_policy(vec![WeightedOperator::new(Arc::new(NoopOperator), 1.0)])
        .selector(Arc::new(FirstSelect))
        .topological_mutations(MutationCountPolicy::Const(1))
        .population_size(10)
        .elite_count(3)
        .generations(1)
        .input_neuron_ids(vec!["in-0".into()])
        .output_neuron_ids(vec!["out-0".into()])
        .build()
        .unwrap();

    let mut species_by_genome_id = HashMap::new();
    let mut ranked = Vec::new();
    for i in 0..6 {
        let id = format!("a{i}");
        species_by_genome_id.insert(id.clone(), SpeciesKey("A".into()));
        ranked.push(ScoredGenome::new(Genome::new(id), 1.0, Trace::empty()));
    }
    for i in 0..4 {
        let id = format!("b{i}");
        species_by_genome_id.insert(id.clone(), SpeciesKey("B".into()));
        ranked.push(ScoredGenome::new(Genome::new(id), 2.0, Trace::empty()));
    }
    // FirstSelect always returns the head of whatever slice it's handed, and
    // the planner slices per species, so offspring parent ids reveal which
    // species produced them.
    ranked.sort_by(|x, y| y.fitness.partial_cmp(&x.fitness).unwrap());

    let ctx = RunContext::new();
    let mut rng = SmallRng::seed_from_u64(3);
    // elite_count=3 claims the top 3 (all species B, highest fitness), so the
    // remaining 7 slots are apportioned across the full A/B split this test
    // is checking — 2 for A, 5 for B.
    let outcome = next_generation(&ctx, &config, &ranked, &species_by_genome_id, 0, &mut rng).unwrap();

    let offspring = &outcome.lineage[config.elite_count..];
    assert_eq!(offspring.len(), 7);

    let from_a = offspring.iter().filter(|r| r.parent_id.as_deref().unwrap_or("").starts_with('a')).count();
    let from_b = offspring.iter().filter(|r| r.parent_id.as_deref().unwrap_or("").starts_with('b')).count();
    assert_eq!(from_a, 2);
    assert_eq!(from_b, 5);
}

/// S3: a species-shared-tournament selector with `StagnationGenerations=3`
/// excludes a species whose best fitness has gone unchanged for 4
/// generations from selection in generation 5.
#[test]
fn s3_stagnant_species_excluded_after_threshold() {
    let selector = SpeciesSharedTournamentSelector::new("topology")
        .unwrap()
        .with_pool(6)
        .with_tournament_size(1)
        .with_stagnation(3);

    let mut species_map = HashMap::new();
    for id in ["x1", "x2"] {
        species_map.insert(id.to_string(), SpeciesKey("X".into()));
    }
    for id in ["y1", "y2"] {
        species_map.insert(id.to_string(), SpeciesKey("Y".into()));
    }

    let mut rng = SmallRng::seed_from_u64(42);

    // Generations 0..=4: X's best fitness never changes, Y's improves each
    // generation, so X's `last_improved_generation` sticks at 0 while Y keeps
    // advancing — establishing X's stagnation by the time generation 5 runs.
    for gen in 0..5 {
        let ranked = vec![
            ScoredGenome::new(Genome::new("x1"), 5.0, Trace::empty()),
            ScoredGenome::new(Genome::new("x2"), 5.0, Trace::empty()),
            ScoredGenome::new(Genome::new("y1"), 1.0 + gen as f64, Trace::empty()),
            ScoredGenome::new(Genome::new("y2"), 1.0 + gen as f64, Trace::empty()),
        ];
        selector.pick_for_generation_with_species(&mut rng, &ranked, 0, gen, &species_map);
    }

    // Generation 5: X has been stagnant since generation 0, a gap of 5 > 3,
    // so only Y should ever be drawn from.
    let ranked = vec![
        ScoredGenome::new(Genome::new("x1"), 5.0, Trace::empty()),
        ScoredGenome::new(Genome::new("x2"), 5.0, Trace::empty()),
        ScoredGenome::new(Genome::new("y1"), 6.0, Trace::empty()),
        ScoredGenome::new(Genome::new("y2"), 6.0, Trace::empty()),
    ];
    for _ in 0..50 {
        let picked = selector.pick_for_generation_with_species(&mut rng, &ranked, 0, 5, &species_map);
        assert!(picked.genome.id.starts_with('y'), "expected stagnant species X to be excluded, picked {}", picked.genome.id);
    }
}

/// S4: `addSynapse` raises a sentinel `NoSynapses` error whenever there is
/// no legal target, while `split` always succeeds; with `mutationCount=1`
/// and both operators in the policy, the child's lineage operation is
/// exactly `"split"` with no fatal error — driven through a full `run`
/// rather than `produce_child` directly. `addSynapse` is weighted far below
/// `split` so the retry loop's eventual `split` draw is certain in practice
/// within the mutation budget, matching the teacher's own tolerance for
/// statistically-certain-rather-than-forced RNG outcomes in selector tests.
#[test]
fn s4_mutation_retry_end_to_end() {
    struct FlakyAddSynapse;
    impl Operator for FlakyAddSynapse {
        fn name(&self) -> &str {
            "addSynapse"
        }
        fn apply(&self, _genome: &Genome) -> plexus_error::PlexusResult<Genome> {
            Err(PlexusError::MutationSentinel {
                kind: SentinelKind::NoSynapses,
                operator: "addSynapse".into(),
            })
        }
    }
    struct Split;
    impl Operator for Split {
        fn name(&self) -> &str {
            "split"
        }
        fn apply(&self, genome: &Genome) -> plexus_error::PlexusResult<Genome> {
            Ok(genome.clone())
        }
    }

    let policy = vec![
        WeightedOperator::new(Arc::new(FlakyAddSynapse), 1.0),
        WeightedOperator::new(Arc::new(Split), 1000.0),
    ];

    let config = Arc::new(
        MonitorConfig::builder()
            .scape(Arc::new(LinearScape))
            .cortex_builder(Arc::new(FitnessCortexBuilder))
            .mutation(Arc::new(NoopOperator))
            .mutation_policy(policy)
            .selector(Arc::new(FirstSelect))
            .topological_mutations(MutationCountPolicy::Const(1))
            .population_size(2)
            .elite_count(1)
            .generations(1)
            .input_neuron_ids(vec!["in-0".into()])
            .output_neuron_ids(vec!["out-0".into()])
            .build()
            .unwrap(),
    );

    let population = seeded_population(&[0.1, 0.2]);
    let outcome = run(config, RunContext::new(), population).unwrap();

    let offspring_records: Vec<_> = outcome.lineage.iter().filter(|r| r.operation != "seed" && r.operation != "elite_clone").collect();
    assert_eq!(offspring_records.len(), 1);
    assert_eq!(offspring_records[0].operation, "split");
}

/// S5: `fitnessGoal=0.9` and generation 3's best is 0.95 — the run returns
/// after generation 3 with `BestByGeneration` of length 3 and no offspring
/// planned for generation 4.
#[test]
fn s5_goal_termination_end_to_end() {
    const POPULATION_SIZE: usize = 2;

    // Each generation evaluates exactly `POPULATION_SIZE` genomes, and the
    // scheduler never overlaps one generation's evaluation with the next, so
    // a shared call counter divided by population size gives the current
    // generation index without needing to read it back out of genome state.
    struct RisingScape {
        calls: std::sync::atomic::AtomicUsize,
    }
    impl Scape for RisingScape {
        fn name(&self) -> &str {
            "rising"
        }
        fn evaluate(&self, _ctx: &RunContext, _cortex: &Cortex) -> plexus_error::PlexusResult<(f64, Trace)> {
            let call_index = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let generation = call_index / POPULATION_SIZE;
            let best = match generation {
                0 => 0.3,
                1 => 0.6,
                _ => 0.95,
            };
            Ok((best, Trace::empty()))
        }
    }

    let config = Arc::new(
        MonitorConfig::builder()
            .scape(Arc::new(RisingScape {
                calls: std::sync::atomic::AtomicUsize::new(0),
            }))
            .cortex_builder(Arc::new(FitnessCortexBuilder))
            .mutation(Arc::new(NoopOperator))
            .mutation_policy(vec![WeightedOperator::new(Arc::new(NoopOperator), 1.0)])
            .selector(Arc::new(FirstSelect))
            .topological_mutations(MutationCountPolicy::Const(1))
            .population_size(POPULATION_SIZE)
            .elite_count(1)
            .generations(6)
            .workers(1)
            .fitness_goal(0.9)
            .input_neuron_ids(vec!["in-0".into()])
            .output_neuron_ids(vec!["out-0".into()])
            .build()
            .unwrap(),
    );

    let population = seeded_population(&[0.1, 0.2]);
    let outcome = run(config, RunContext::new(), population).unwrap();

    assert_eq!(outcome.best_by_generation.len(), 3);
    assert_eq!(outcome.best_by_generation, vec![0.3, 0.6, 0.95]);
}

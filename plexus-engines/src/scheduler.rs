use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use plexus_core::config::MonitorConfig;
use plexus_core::ctx::RunContext;
use plexus_core::diagnostics::{GenerationDiagnostics, SpeciesGeneration};
use plexus_core::genome::Genome;
use plexus_core::lineage::LineageRecord;
use plexus_core::signature::signature;
use plexus_core::thread_pool::ThreadPool;
use plexus_error::{PlexusError, PlexusResult};

use crate::evaluator::evaluate;
use crate::offspring::next_generation;
use crate::speciation::assign;

/// Ensures the `tracing` subscriber is installed at most once, mirroring the
/// teacher's process-wide logging init so a host embedding the engine never
/// double-registers a global subscriber.
pub fn init_logging() {
    use std::sync::Once;
    static INIT_LOGGING: Once = Once::new();

    INIT_LOGGING.call_once(|| {
        use tracing_subscriber::fmt::format::FmtSpan;
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                    .with_target(false)
                    .compact(),
            )
            .init();
    });
}

/// Everything a completed (or early-terminated) run produced (§4.7 step 4).
pub struct RunOutcome {
    pub best_by_generation: Vec<f64>,
    pub diagnostics: Vec<GenerationDiagnostics>,
    pub species_history: Vec<SpeciesGeneration>,
    pub final_population: Vec<Genome>,
    pub lineage: Vec<LineageRecord>,
}

/// Runs the outer generation loop (C8) to completion or early termination.
///
/// `config` is `Arc`-held so the same handle can be threaded into the
/// parallel evaluator's per-job closures without re-cloning its trait-object
/// fields one at a time.
pub fn run(config: Arc<MonitorConfig>, ctx: RunContext, initial_population: Vec<Genome>) -> PlexusResult<RunOutcome> {
    if initial_population.len() != config.population_size {
        return Err(PlexusError::Configuration {
            message: format!(
                "initial population length {} does not match populationSize {}",
                initial_population.len(),
                config.population_size
            )
            .into(),
        });
    }

    // Property 10: a pre-cancelled context returns before any diagnostics exist.
    ctx.check()?;

    let seed_operation = if config.generation_offset > 0 { "continue_seed" } else { "seed" };
    let mut lineage: Vec<LineageRecord> = initial_population
        .iter()
        .map(|genome| {
            let sig = signature(genome);
            LineageRecord::new(genome.id.clone(), None, config.generation_offset, seed_operation, &sig)
        })
        .collect();

    let control = config.take_control_stream();
    let pool = ThreadPool::new(config.workers.min(config.population_size.max(1)));
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut state = config.new_speciation_state();

    let mut population = initial_population;
    let mut evaluations = 0usize;
    let mut best_by_generation = Vec::with_capacity(config.generations);
    let mut diagnostics = Vec::with_capacity(config.generations);
    let mut species_history = Vec::new();

    for gen in 0..config.generations {
        ctx.check()?;
        control.drain_nonblocking();
        if control.is_stopped() {
            debug!(generation = gen, "stopped before evaluation");
            break;
        }

        let logical_gen = config.generation_offset + gen;

        let evaluated = evaluate(&ctx, &pool, &config, &population, logical_gen)?;
        let mut scored = evaluated.scored;
        for sg in &mut scored {
            sg.fitness = (config.postprocessor)(sg.fitness);
        }
        scored.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(std::cmp::Ordering::Equal));

        evaluations += scored.len();
        let best_fitness = scored.first().map(|sg| sg.fitness).unwrap_or(f64::NEG_INFINITY);
        let worst_fitness = scored.last().map(|sg| sg.fitness).unwrap_or(f64::NEG_INFINITY);
        let mean_fitness = scored.iter().map(|sg| sg.fitness).sum::<f64>() / scored.len().max(1) as f64;
        best_by_generation.push(best_fitness);

        let assignment = assign(&mut state, &scored);

        let mut species_summaries = Vec::with_capacity(assignment.members.len());
        for (key, indices) in &assignment.members {
            let fitnesses: Vec<f64> = indices.iter().map(|&i| scored[i].fitness).collect();
            let size = fitnesses.len();
            let species_mean = fitnesses.iter().sum::<f64>() / size as f64;
            let species_best = fitnesses.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let representative_id = state.representatives.get(key).map(|g| g.id.clone()).unwrap_or_default();

            let summary = SpeciesGeneration {
                key: key.clone(),
                generation: logical_gen,
                size,
                mean_fitness: species_mean,
                best_fitness: species_best,
                representative_id,
            };
            species_history.push(summary.clone());
            species_summaries.push(summary);
        }

        info!(
            generation = logical_gen,
            best = best_fitness,
            species = species_summaries.len(),
            "evaluated generation"
        );

        diagnostics.push(GenerationDiagnostics {
            generation: logical_gen,
            population_size: scored.len(),
            best_fitness,
            mean_fitness,
            worst_fitness,
            threshold: state.threshold,
            species: species_summaries,
            new_species: assignment.new_species.clone(),
            extinct_species: assignment.extinct_species.clone(),
            tuning: evaluated.tuning,
        });

        let goal_reached = config.fitness_goal.is_some_and(|goal| best_fitness >= goal);
        let limit_reached = config.evaluations_limit > 0 && evaluations >= config.evaluations_limit;
        if goal_reached || limit_reached {
            info!(generation = logical_gen, goal_reached, limit_reached, "terminating run");
            population = scored.into_iter().map(|sg| sg.genome).collect();
            break;
        }

        control.drain_nonblocking();
        control.block_while_paused(&ctx.flag());
        if control.is_stopped() {
            population = scored.into_iter().map(|sg| sg.genome).collect();
            break;
        }
        ctx.check()?;

        let outcome = next_generation(&ctx, &config, &scored, &assignment.by_genome_id, logical_gen, &mut rng)?;
        lineage.extend(outcome.lineage);
        population = outcome.population;
    }

    Ok(RunOutcome {
        best_by_generation,
        diagnostics,
        species_history,
        final_population: population,
        lineage,
    })
}

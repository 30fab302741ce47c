use std::sync::Arc;

use plexus_core::config::MonitorConfig;
use plexus_core::ctx::RunContext;
use plexus_core::diagnostics::TuningStats;
use plexus_core::genome::{Genome, ScoredGenome, Trace};
use plexus_core::scape::TuneReport;
use plexus_core::thread_pool::ThreadPool;
use plexus_error::PlexusResult;

/// The result of scoring one full population (C6).
pub struct EvaluatedGeneration {
    pub scored: Vec<ScoredGenome>,
    pub tuning: TuningStats,
}

/// Builds a cortex for `genome` and scores it against `config.scape`. Used
/// both for the final per-genome score and as the tuner's fitness probe.
/// `ctx` is passed through to `Scape::evaluate` so a slow scape can observe
/// cancellation mid-call rather than only before the job starts.
fn score_genome(config: &MonitorConfig, ctx: &RunContext, genome: &Genome) -> PlexusResult<(f64, Trace)> {
    let cortex = config.cortex_builder.build(genome, config.scape.name())?;
    config.scape.evaluate(ctx, &cortex)
}

/// One job's pipeline (§4.5): optional tuning, then final scoring.
fn run_job(
    config: &MonitorConfig,
    ctx: &RunContext,
    genome: &Genome,
    generation: usize,
) -> PlexusResult<(Genome, f64, Trace, TuneReport)> {
    let attempts = config.tune_attempt_policy.attempts(
        config.tune_attempts,
        generation,
        config.generations,
        genome,
    );

    let (final_genome, report) = if let (Some(tuner), true) = (config.tuner.as_ref(), attempts > 0) {
        let probe = |candidate: &Genome| -> PlexusResult<f64> {
            score_genome(config, ctx, candidate).map(|(fitness, _)| fitness)
        };
        tuner.tune_with_report(ctx, genome, attempts, &probe)?
    } else {
        (genome.clone(), TuneReport::default())
    };

    let (fitness, trace) = score_genome(config, ctx, &final_genome)?;
    Ok((final_genome, fitness, trace, report))
}

/// Evaluates every member of `population` under `pool`, reassembling results
/// into an index-keyed array so ordering is deterministic regardless of
/// which worker finishes first (§4.5, §5). `config` is `Arc`-held by the
/// scheduler so each job closure can own a cheap clone of it across the
/// thread boundary.
pub fn evaluate(
    ctx: &RunContext,
    pool: &ThreadPool,
    config: &Arc<MonitorConfig>,
    population: &[Genome],
    generation: usize,
) -> PlexusResult<EvaluatedGeneration> {
    ctx.check()?;

    let handles: Vec<_> = population
        .iter()
        .cloned()
        .map(|genome| {
            let job_ctx = ctx.clone();
            let job_config = Arc::clone(config);
            pool.submit_with_result(move || -> PlexusResult<(Genome, f64, Trace, TuneReport)> {
                job_ctx.check()?;
                run_job(&job_config, &job_ctx, &genome, generation)
            })
        })
        .collect();

    let mut scored = Vec::with_capacity(population.len());
    let mut tuning = TuningStats::default();
    let mut first_error = None;

    for handle in handles {
        match handle.result() {
            Ok((genome, fitness, trace, report)) => {
                tuning.merge(&report.as_tuning_stats());
                scored.push(ScoredGenome::new(genome, fitness, trace));
            }
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    Ok(EvaluatedGeneration { scored, tuning })
}

use plexus_error::PlexusResult;

use crate::ctx::RunContext;
use crate::diagnostics::TuningStats;
use crate::genome::{Genome, Trace};

/// An evaluable neural network built from a genome plus resolved sensors,
/// actuators, and substrate. Constructed fresh per evaluation by an external
/// cortex builder; the core never inspects its contents.
pub struct Cortex(Box<dyn std::any::Any + Send>);

impl Cortex {
    pub fn new<T: std::any::Any + Send>(value: T) -> Self {
        Cortex(Box::new(value))
    }

    pub fn downcast_ref<T: std::any::Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

/// The task environment that turns a cortex into a fitness value.
///
/// `ctx` is threaded through so a long-running implementation can observe
/// cancellation mid-call — §5's suspension point (a) "fitness evaluation
/// inside `scape.Evaluate`" is only real if the scape itself can see the
/// run's [`RunContext`], not just the worker that dispatches the call.
pub trait Scape: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, ctx: &RunContext, cortex: &Cortex) -> PlexusResult<(f64, Trace)>;
}

/// Builds a [`Cortex`] for a genome. Substrate/I-O resolution is entirely an
/// external concern; the core only calls through this seam.
pub trait CortexBuilder: Send + Sync {
    fn build(&self, genome: &Genome, scape_name: &str) -> PlexusResult<Cortex>;
}

/// Decides how many tuning attempts a genome receives this generation.
pub trait AttemptPolicy: Send + Sync {
    fn attempts(
        &self,
        configured: usize,
        generation: usize,
        total_generations: usize,
        genome: &Genome,
    ) -> usize;
}

/// A fixed attempt policy that always returns the configured value verbatim.
pub struct FixedAttempts;

impl AttemptPolicy for FixedAttempts {
    fn attempts(&self, configured: usize, _generation: usize, _total_generations: usize, _genome: &Genome) -> usize {
        configured
    }
}

/// Counters reported by a tuner that opts into reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct TuneReport {
    pub attempts_planned: usize,
    pub attempts_executed: usize,
    pub candidate_evaluations: usize,
    pub accepted_candidates: usize,
    pub rejected_candidates: usize,
    pub goal_reached: bool,
}

impl TuneReport {
    /// The report synthesized for a non-reporting tuner: planned and
    /// executed both equal the attempt count, every other counter zero.
    pub fn non_reporting(attempts: usize) -> Self {
        TuneReport {
            attempts_planned: attempts,
            attempts_executed: attempts,
            ..Default::default()
        }
    }

    pub fn has_activity(&self) -> bool {
        self.attempts_planned > 0 || self.attempts_executed > 0 || self.candidate_evaluations > 0
    }

    /// Converts a single job's report into the generation-wide accumulator
    /// shape, so callers can fold it in with [`TuningStats::merge`] instead
    /// of re-deriving the same field-by-field sum at each call site.
    pub fn as_tuning_stats(&self) -> TuningStats {
        TuningStats {
            attempts_planned: self.attempts_planned,
            attempts_executed: self.attempts_executed,
            candidate_evaluations: self.candidate_evaluations,
            accepted_candidates: self.accepted_candidates,
            rejected_candidates: self.rejected_candidates,
            invocations: if self.has_activity() { 1 } else { 0 },
            goal_reached_count: if self.goal_reached { 1 } else { 0 },
        }
    }
}

/// A local parameter tuner invoked before final scoring.
///
/// `ctx` is threaded through for the same reason as [`Scape::evaluate`]:
/// §5's suspension point (b) "tuner invocation" requires the tuner itself to
/// be able to observe cancellation across however many candidate
/// evaluations it runs internally.
pub trait Tuner: Send + Sync {
    fn tune(
        &self,
        ctx: &RunContext,
        genome: &Genome,
        attempts: usize,
        fitness_probe: &dyn Fn(&Genome) -> PlexusResult<f64>,
    ) -> PlexusResult<Genome>;

    /// Reporting variant; the default synthesizes a report from `tune`'s
    /// plain outcome so non-reporting tuners remain usable everywhere a
    /// report is expected.
    fn tune_with_report(
        &self,
        ctx: &RunContext,
        genome: &Genome,
        attempts: usize,
        fitness_probe: &dyn Fn(&Genome) -> PlexusResult<f64>,
    ) -> PlexusResult<(Genome, TuneReport)> {
        let tuned = self.tune(ctx, genome, attempts, fitness_probe)?;
        Ok((tuned, TuneReport::non_reporting(attempts)))
    }

    /// Capability hook: tuners that can chase an explicit fitness goal
    /// implement this; the scheduler calls it once at construction.
    fn set_goal_fitness(&self, _goal: f64) {}
}

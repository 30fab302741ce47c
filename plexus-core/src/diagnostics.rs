use crate::species::SpeciesKey;

/// Aggregated tune-attempt counters for a single generation, summed across
/// every job the parallel evaluator ran a tuner for.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TuningStats {
    pub attempts_planned: usize,
    pub attempts_executed: usize,
    pub candidate_evaluations: usize,
    pub accepted_candidates: usize,
    pub rejected_candidates: usize,
    /// Number of jobs where the tune report showed any planned, executed, or
    /// evaluated activity at all.
    pub invocations: usize,
    pub goal_reached_count: usize,
}

impl TuningStats {
    pub fn merge(&mut self, other: &TuningStats) {
        self.attempts_planned += other.attempts_planned;
        self.attempts_executed += other.attempts_executed;
        self.candidate_evaluations += other.candidate_evaluations;
        self.accepted_candidates += other.accepted_candidates;
        self.rejected_candidates += other.rejected_candidates;
        self.invocations += other.invocations;
        self.goal_reached_count += other.goal_reached_count;
    }
}

/// A single species' standing as of one generation, recorded alongside the
/// generation's overall diagnostics.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeciesGeneration {
    pub key: SpeciesKey,
    pub generation: usize,
    pub size: usize,
    pub mean_fitness: f64,
    pub best_fitness: f64,
    pub representative_id: String,
}

/// A per-generation summary: population statistics, species membership
/// deltas, and tuning counters. Append-only — one entry per generation run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationDiagnostics {
    pub generation: usize,
    pub population_size: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub worst_fitness: f64,
    pub threshold: f64,
    pub species: Vec<SpeciesGeneration>,
    pub new_species: Vec<SpeciesKey>,
    pub extinct_species: Vec<SpeciesKey>,
    pub tuning: TuningStats,
}

use rand::Rng;
use rand::RngCore;

use plexus_core::{Select, ScoredGenome};

/// Uniform draw over `ranked[0..elite_count)` — the survivors the offspring
/// planner has already cloned verbatim; this selector is for callers that
/// want an elite-biased parent without going through the planner's own
/// elite-clone step.
#[derive(Debug, Default)]
pub struct EliteSelector;

impl EliteSelector {
    pub fn new() -> Self {
        EliteSelector
    }
}

impl Select for EliteSelector {
    fn name(&self) -> &str {
        "elite"
    }

    fn pick<'a>(
        &self,
        rng: &mut dyn RngCore,
        ranked: &'a [ScoredGenome],
        elite_count: usize,
    ) -> &'a ScoredGenome {
        let bound = elite_count.min(ranked.len()).max(1);
        let idx = rng.random_range(0..bound);
        &ranked[idx]
    }
}

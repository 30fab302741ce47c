use std::sync::Arc;
use std::sync::mpsc;

use plexus_error::{PlexusError, PlexusResult};

use crate::control::{ControlCommand, ControlStream};
use crate::operator::{Operator, WeightedOperator};
use crate::rate::MutationCountPolicy;
use crate::scape::{AttemptPolicy, CortexBuilder, Scape, Tuner};
use crate::selector::Select;

/// A fitness transform applied after evaluation, identity by default.
pub type FitnessPostprocessor = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Immutable run parameters, validated once at construction time by the
/// generation scheduler. Every field mirrors a recognized `MonitorConfig`
/// option; accessors hand out cheap `Arc` clones the way the teacher's
/// engine config does.
pub struct MonitorConfig {
    pub scape: Arc<dyn Scape>,
    pub cortex_builder: Arc<dyn CortexBuilder>,
    pub mutation: Arc<dyn Operator>,
    pub mutation_policy: Vec<WeightedOperator>,
    pub selector: Arc<dyn Select>,
    pub postprocessor: FitnessPostprocessor,
    pub topological_mutations: MutationCountPolicy,
    pub population_size: usize,
    pub elite_count: usize,
    pub specie_size_limit: usize,
    pub generations: usize,
    pub generation_offset: usize,
    pub fitness_goal: Option<f64>,
    pub evaluations_limit: usize,
    pub workers: usize,
    pub seed: u64,
    pub input_neuron_ids: Vec<String>,
    pub output_neuron_ids: Vec<String>,
    pub tuner: Option<Arc<dyn Tuner>>,
    pub tune_attempts: usize,
    pub tune_attempt_policy: Arc<dyn AttemptPolicy>,
    pub target_species_count: usize,
    pub species_threshold: f64,
    pub species_min_threshold: f64,
    pub species_max_threshold: f64,
    pub species_threshold_adjust_step: f64,
    control_receiver: std::sync::Mutex<Option<mpsc::Receiver<ControlCommand>>>,
}

impl MonitorConfig {
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Builds the scheduler-owned control stream, consuming the configured
    /// receiver. Returns `ControlStream::none()` if none was configured.
    /// Only meaningful to call once.
    pub fn take_control_stream(&self) -> ControlStream {
        match self.control_receiver.lock().unwrap().take() {
            Some(receiver) => ControlStream::new(receiver),
            None => ControlStream::none(),
        }
    }

    pub fn survivor_count(&self) -> usize {
        self.elite_count
    }

    pub fn offspring_count(&self) -> usize {
        self.population_size.saturating_sub(self.elite_count)
    }

    /// Builds a fresh [`crate::species::SpeciationState`] seeded from this
    /// config's speciation knobs, for the scheduler to own for the life of a run.
    pub fn new_speciation_state(&self) -> crate::species::SpeciationState {
        crate::species::SpeciationState::new(
            self.target_species_count,
            self.species_threshold,
            self.species_min_threshold,
            self.species_max_threshold,
            self.species_threshold_adjust_step,
        )
    }
}

#[derive(Default)]
pub struct MonitorConfigBuilder {
    scape: Option<Arc<dyn Scape>>,
    cortex_builder: Option<Arc<dyn CortexBuilder>>,
    mutation: Option<Arc<dyn Operator>>,
    mutation_policy: Vec<WeightedOperator>,
    selector: Option<Arc<dyn Select>>,
    postprocessor: Option<FitnessPostprocessor>,
    topological_mutations: Option<MutationCountPolicy>,
    population_size: usize,
    elite_count: Option<usize>,
    survival_percentage: Option<f64>,
    specie_size_limit: usize,
    generations: usize,
    generation_offset: usize,
    fitness_goal: Option<f64>,
    evaluations_limit: usize,
    workers: Option<usize>,
    seed: Option<u64>,
    input_neuron_ids: Vec<String>,
    output_neuron_ids: Vec<String>,
    tuner: Option<Arc<dyn Tuner>>,
    tune_attempts: usize,
    tune_attempt_policy: Option<Arc<dyn AttemptPolicy>>,
    target_species_count: Option<usize>,
    species_threshold: Option<f64>,
    species_min_threshold: Option<f64>,
    species_max_threshold: Option<f64>,
    species_threshold_adjust_step: Option<f64>,
    control_receiver: Option<mpsc::Receiver<ControlCommand>>,
}

macro_rules! setter {
    ($name:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.$name = Some(value);
            self
        }
    };
}

impl MonitorConfigBuilder {
    setter!(scape, Arc<dyn Scape>);
    setter!(cortex_builder, Arc<dyn CortexBuilder>);
    setter!(mutation, Arc<dyn Operator>);
    setter!(selector, Arc<dyn Select>);
    setter!(postprocessor, FitnessPostprocessor);
    setter!(topological_mutations, MutationCountPolicy);
    setter!(elite_count, usize);
    setter!(survival_percentage, f64);
    setter!(workers, usize);
    setter!(seed, u64);
    setter!(tuner, Arc<dyn Tuner>);
    setter!(tune_attempt_policy, Arc<dyn AttemptPolicy>);
    setter!(target_species_count, usize);
    setter!(species_threshold, f64);
    setter!(species_min_threshold, f64);
    setter!(species_max_threshold, f64);
    setter!(species_threshold_adjust_step, f64);

    pub fn mutation_policy(mut self, policy: Vec<WeightedOperator>) -> Self {
        self.mutation_policy = policy;
        self
    }

    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = value;
        self
    }

    pub fn specie_size_limit(mut self, value: usize) -> Self {
        self.specie_size_limit = value;
        self
    }

    pub fn generations(mut self, value: usize) -> Self {
        self.generations = value;
        self
    }

    pub fn generation_offset(mut self, value: usize) -> Self {
        self.generation_offset = value;
        self
    }

    pub fn fitness_goal(mut self, value: f64) -> Self {
        self.fitness_goal = Some(value);
        self
    }

    pub fn evaluations_limit(mut self, value: usize) -> Self {
        self.evaluations_limit = value;
        self
    }

    pub fn input_neuron_ids(mut self, ids: Vec<String>) -> Self {
        self.input_neuron_ids = ids;
        self
    }

    pub fn output_neuron_ids(mut self, ids: Vec<String>) -> Self {
        self.output_neuron_ids = ids;
        self
    }

    pub fn tune_attempts(mut self, value: usize) -> Self {
        self.tune_attempts = value;
        self
    }

    pub fn control_receiver(mut self, receiver: mpsc::Receiver<ControlCommand>) -> Self {
        self.control_receiver = Some(receiver);
        self
    }

    /// Validates every invariant in §3/§4.7 and assembles the immutable
    /// config, deriving `elite_count` from `survival_percentage` when the
    /// former is absent. Returns descriptive errors; no partial config is
    /// ever produced.
    pub fn build(self) -> PlexusResult<MonitorConfig> {
        if self.population_size == 0 {
            return Err(config_err("populationSize must be > 0"));
        }
        if self.generations == 0 {
            return Err(config_err("generations must be > 0"));
        }
        if self.input_neuron_ids.is_empty() {
            return Err(config_err("inputNeuronIDs must be non-empty"));
        }
        if self.output_neuron_ids.is_empty() {
            return Err(config_err("outputNeuronIDs must be non-empty"));
        }

        let elite_count = match (self.elite_count, self.survival_percentage) {
            (Some(elite_count), _) => elite_count,
            (None, Some(pct)) => {
                if !(0.0..=1.0).contains(&pct) {
                    return Err(config_err("survivalPercentage must be in [0, 1]"));
                }
                ((self.population_size as f64) * pct).round().max(1.0) as usize
            }
            (None, None) => return Err(config_err("either eliteCount or survivalPercentage is required")),
        };
        if elite_count < 1 || elite_count > self.population_size {
            return Err(config_err("eliteCount must be in [1, populationSize]"));
        }

        let workers = self.workers.unwrap_or(1);
        if workers == 0 {
            return Err(config_err("workers must be > 0"));
        }

        if let Some(goal) = self.fitness_goal {
            if goal <= 0.0 {
                return Err(config_err("fitnessGoal must be > 0 when set (0 disables it)"));
            }
        }

        let species_min_threshold = self.species_min_threshold.unwrap_or(0.3);
        let species_max_threshold = self.species_max_threshold.unwrap_or(6.0);
        if species_min_threshold <= 0.0 || species_min_threshold > species_max_threshold {
            return Err(config_err("speciesMinThreshold must be > 0 and <= speciesMaxThreshold"));
        }
        let species_threshold = self
            .species_threshold
            .unwrap_or(species_min_threshold)
            .clamp(species_min_threshold, species_max_threshold);
        let species_threshold_adjust_step = self.species_threshold_adjust_step.unwrap_or(0.2);
        if species_threshold_adjust_step <= 0.0 {
            return Err(config_err("speciesThresholdAdjustStep must be > 0"));
        }
        let target_species_count = self
            .target_species_count
            .unwrap_or_else(|| crate::species::SpeciationState::default_target_species_count(self.population_size));

        if self.mutation_policy.iter().any(|w| w.weight < 0.0) {
            return Err(config_err("mutationPolicy weights must be non-negative"));
        }
        if !self.mutation_policy.is_empty() && self.mutation_policy.iter().all(|w| w.weight <= 0.0) {
            return Err(config_err("mutationPolicy must contain at least one positive weight"));
        }

        let scape = self.scape.ok_or_else(|| config_err("scape is required"))?;
        let cortex_builder = self
            .cortex_builder
            .ok_or_else(|| config_err("cortex_builder is required"))?;
        let mutation = self.mutation.ok_or_else(|| config_err("mutation is required"))?;
        let selector = self.selector.ok_or_else(|| config_err("selector is required"))?;
        let topological_mutations = self
            .topological_mutations
            .ok_or_else(|| config_err("topologicalMutations is required"))?;
        let tune_attempt_policy = self
            .tune_attempt_policy
            .unwrap_or_else(|| Arc::new(crate::scape::FixedAttempts));

        if self.tuner.is_some() {
            if let Some(goal) = self.fitness_goal {
                self.tuner.as_ref().unwrap().set_goal_fitness(goal);
            }
        }

        Ok(MonitorConfig {
            scape,
            cortex_builder,
            mutation,
            mutation_policy: self.mutation_policy,
            selector,
            postprocessor: self.postprocessor.unwrap_or_else(|| Arc::new(|f| f)),
            topological_mutations,
            population_size: self.population_size,
            elite_count,
            specie_size_limit: self.specie_size_limit,
            generations: self.generations,
            generation_offset: self.generation_offset,
            fitness_goal: self.fitness_goal,
            evaluations_limit: self.evaluations_limit,
            workers,
            seed: self.seed.unwrap_or(0),
            input_neuron_ids: self.input_neuron_ids,
            output_neuron_ids: self.output_neuron_ids,
            tuner: self.tuner,
            tune_attempts: self.tune_attempts,
            tune_attempt_policy,
            target_species_count,
            species_threshold,
            species_min_threshold,
            species_max_threshold,
            species_threshold_adjust_step,
            control_receiver: std::sync::Mutex::new(self.control_receiver),
        })
    }
}

fn config_err(message: &str) -> PlexusError {
    PlexusError::Configuration {
        message: message.to_string().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;
    use crate::scape::Cortex;

    struct NoopOperator;
    impl Operator for NoopOperator {
        fn name(&self) -> &str {
            "noop"
        }
        fn apply(&self, genome: &Genome) -> PlexusResult<Genome> {
            Ok(genome.clone())
        }
    }

    struct NoopScape;
    impl Scape for NoopScape {
        fn name(&self) -> &str {
            "noop-scape"
        }
        fn evaluate(&self, _ctx: &crate::ctx::RunContext, _cortex: &Cortex) -> PlexusResult<(f64, crate::genome::Trace)> {
            Ok((0.0, crate::genome::Trace::empty()))
        }
    }

    struct NoopCortexBuilder;
    impl CortexBuilder for NoopCortexBuilder {
        fn build(&self, _genome: &Genome, _scape_name: &str) -> PlexusResult<Cortex> {
            Ok(Cortex::new(()))
        }
    }

    struct FirstSelect;
    impl Select for FirstSelect {
        fn pick<'a>(
            &self,
            _rng: &mut dyn rand::RngCore,
            ranked: &'a [crate::genome::ScoredGenome],
            _elite_count: usize,
        ) -> &'a crate::genome::ScoredGenome {
            &ranked[0]
        }
    }

    fn base_builder() -> MonitorConfigBuilder {
        MonitorConfig::builder()
            .scape(Arc::new(NoopScape))
            .cortex_builder(Arc::new(NoopCortexBuilder))
            .mutation(Arc::new(NoopOperator))
            .selector(Arc::new(FirstSelect))
            .topological_mutations(MutationCountPolicy::Const(1))
            .population_size(4)
            .elite_count(1)
            .generations(1)
            .input_neuron_ids(vec!["in-0".into()])
            .output_neuron_ids(vec!["out-0".into()])
    }

    #[test]
    fn rejects_empty_input_neurons() {
        let err = base_builder().input_neuron_ids(vec![]).build().unwrap_err();
        assert_eq!(err.code(), plexus_error::ErrorCode::Configuration);
    }

    #[test]
    fn rejects_elite_count_out_of_range() {
        let err = base_builder().elite_count(0).build().unwrap_err();
        assert_eq!(err.code(), plexus_error::ErrorCode::Configuration);

        let err = base_builder().elite_count(5).build().unwrap_err();
        assert_eq!(err.code(), plexus_error::ErrorCode::Configuration);
    }

    #[test]
    fn derives_elite_count_from_survival_percentage() {
        let config = base_builder()
            .elite_count(1) // overwritten below via a fresh builder path
            .build()
            .unwrap();
        assert_eq!(config.elite_count, 1);

        let config = MonitorConfig::builder()
            .scape(Arc::new(NoopScape))
            .cortex_builder(Arc::new(NoopCortexBuilder))
            .mutation(Arc::new(NoopOperator))
            .selector(Arc::new(FirstSelect))
            .topological_mutations(MutationCountPolicy::Const(1))
            .population_size(10)
            .survival_percentage(0.3)
            .generations(1)
            .input_neuron_ids(vec!["in-0".into()])
            .output_neuron_ids(vec!["out-0".into()])
            .build()
            .unwrap();
        assert_eq!(config.elite_count, 3);
    }

    #[test]
    fn defaults_workers_to_one() {
        let config = base_builder().build().unwrap();
        assert_eq!(config.workers, 1);
    }
}

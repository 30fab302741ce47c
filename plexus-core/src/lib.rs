pub mod config;
pub mod control;
pub mod ctx;
pub mod diagnostics;
pub mod genome;
pub mod identify;
pub mod lineage;
pub mod operator;
pub mod rate;
pub mod registry;
pub mod scape;
pub mod selector;
pub mod signature;
pub mod species;
pub mod thread_pool;
pub mod weighting;

pub use config::{FitnessPostprocessor, MonitorConfig, MonitorConfigBuilder};
pub use control::{ControlCommand, ControlStream};
pub use ctx::RunContext;
pub use diagnostics::{GenerationDiagnostics, SpeciesGeneration, TuningStats};
pub use genome::{Genome, Neuron, ScoredGenome, SubstrateConfig, Synapse, Trace, VersionPair};
pub use lineage::{GenomeSummary, LineageRecord};
pub use operator::{Operator, WeightedOperator};
pub use plexus_error::{PlexusError, PlexusResult};
pub use rate::MutationCountPolicy;
pub use registry::Registry;
pub use scape::{AttemptPolicy, Cortex, CortexBuilder, FixedAttempts, Scape, TuneReport, Tuner};
pub use identify::{SpeciesIdentifier, identifier_by_name};
pub use selector::{Select, clamp, default_pool_size};
pub use signature::{distance, signature, GenomeSignature};
pub use species::{SpeciationState, SpeciesKey};
pub use thread_pool::{ThreadPool, WaitGroup, WorkResult};
pub use weighting::weighted_pick;

//! Parent-selection strategies for the plexus neuro-evolution engine (C3).
//!
//! One file per selector, mirroring the teacher's `radiate-selectors` layout.

pub mod efficiency;
pub mod elite;
pub mod random_selector;
pub mod rank;
pub mod species_common;
pub mod species_shared_tournament;
pub mod species_tournament;
pub mod top_k;
pub mod tournament;

pub use efficiency::EfficiencySelector;
pub use elite::EliteSelector;
pub use random_selector::RandomSelector;
pub use rank::RankSelector;
pub use species_shared_tournament::SpeciesSharedTournamentSelector;
pub use species_tournament::SpeciesTournamentSelector;
pub use top_k::TopKFitnessSelector;
pub use tournament::TournamentSelector;

pub(crate) use plexus_core::weighted_pick;

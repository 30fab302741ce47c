use std::sync::Arc;

use plexus_error::{PlexusError, PlexusResult};

use crate::genome::Genome;
use crate::signature::signature;

/// A species identity function, used by selectors that bucket a ranked pool
/// by species without going through the scheduler's `speciesByGenomeID` map
/// (§4.3, §6).
pub trait SpeciesIdentifier: Send + Sync {
    fn identify(&self, genome: &Genome) -> String;
}

/// Groups genomes purely by topology shape: neuron/synapse/recurrent/sensor/
/// actuator counts. Two genomes with the same shape but different activation
/// tags collapse to the same identity under this identifier.
struct TopologyIdentifier;

impl SpeciesIdentifier for TopologyIdentifier {
    fn identify(&self, genome: &Genome) -> String {
        let sig = signature(genome);
        format!(
            "topo:n{}-s{}-r{}-i{}-o{}",
            sig.total_neurons,
            sig.total_synapses,
            sig.total_recurrent_synapses,
            sig.total_sensors,
            sig.total_actuators,
        )
    }
}

/// Groups genomes by total neuron count alone — coarser than `topology`.
struct TotNIdentifier;

impl SpeciesIdentifier for TotNIdentifier {
    fn identify(&self, genome: &Genome) -> String {
        format!("totn:{}", genome.neurons.len())
    }
}

/// Groups genomes by their full deterministic fingerprint — the finest-
/// grained identity, equivalent to exact topological equality.
///
/// The source's pseudo-test references this name, but its identifier factory
/// rejected it as unknown (see `spec.md` §9 Open Questions). This
/// implementation resolves that disagreement by accepting it explicitly as a
/// first-class identifier rather than leaving it as dead documentation.
struct FingerprintIdentifier;

impl SpeciesIdentifier for FingerprintIdentifier {
    fn identify(&self, genome: &Genome) -> String {
        signature(genome).fingerprint
    }
}

/// Resolves a canonical identifier name to its implementation. Unknown names
/// are a [`plexus_error::ErrorCode::Configuration`] error — this is a closed
/// set, not an open-ended registry.
pub fn identifier_by_name(name: &str) -> PlexusResult<Arc<dyn SpeciesIdentifier>> {
    match name {
        "topology" => Ok(Arc::new(TopologyIdentifier)),
        "tot_n" => Ok(Arc::new(TotNIdentifier)),
        "fingerprint" => Ok(Arc::new(FingerprintIdentifier)),
        other => Err(PlexusError::Configuration {
            message: format!("unknown species identifier \"{other}\"").into(),
        }),
    }
}

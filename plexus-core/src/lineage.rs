use crate::signature::GenomeSignature;

/// An append-only provenance record: one entry per genome ever produced.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineageRecord {
    pub genome_id: String,
    pub parent_id: Option<String>,
    pub generation: usize,
    pub operation: String,
    pub fingerprint: String,
    pub summary: GenomeSummary,
}

/// A denormalized copy of the topology counts from [`GenomeSignature`],
/// flattened for serialization alongside a [`LineageRecord`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenomeSummary {
    pub total_neurons: usize,
    pub total_synapses: usize,
    pub total_recurrent_synapses: usize,
    pub total_sensors: usize,
    pub total_actuators: usize,
}

impl From<&GenomeSignature> for GenomeSummary {
    fn from(sig: &GenomeSignature) -> Self {
        GenomeSummary {
            total_neurons: sig.total_neurons,
            total_synapses: sig.total_synapses,
            total_recurrent_synapses: sig.total_recurrent_synapses,
            total_sensors: sig.total_sensors,
            total_actuators: sig.total_actuators,
        }
    }
}

impl LineageRecord {
    pub fn new(
        genome_id: impl Into<String>,
        parent_id: Option<String>,
        generation: usize,
        operation: impl Into<String>,
        signature: &GenomeSignature,
    ) -> Self {
        LineageRecord {
            genome_id: genome_id.into(),
            parent_id,
            generation,
            operation: operation.into(),
            fingerprint: signature.fingerprint.clone(),
            summary: signature.into(),
        }
    }
}

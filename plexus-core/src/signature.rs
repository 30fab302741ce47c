use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::genome::Genome;

/// A deterministic summary of a genome's topology.
///
/// Two genomes with identical topology (same neuron/synapse/sensor/actuator
/// counts and activation/aggregator tags, up to canonical ordering) yield an
/// identical [`GenomeSignature`], including an identical `fingerprint`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomeSignature {
    pub fingerprint: String,
    pub total_neurons: usize,
    pub total_synapses: usize,
    pub total_recurrent_synapses: usize,
    pub total_sensors: usize,
    pub total_actuators: usize,
    pub activation_distribution: BTreeMap<String, usize>,
    pub aggregator_distribution: BTreeMap<String, usize>,
}

/// Computes the deterministic signature of a genome.
///
/// Neurons and synapses are sorted by identifier before hashing so that
/// insertion order never affects the fingerprint.
pub fn signature(genome: &Genome) -> GenomeSignature {
    let mut neurons: Vec<_> = genome.neurons.iter().collect();
    neurons.sort_by_key(|n| n.id);

    let mut synapses: Vec<_> = genome.synapses.iter().collect();
    synapses.sort_by_key(|s| s.id);

    let mut activation_distribution = BTreeMap::new();
    let mut aggregator_distribution = BTreeMap::new();
    for n in &neurons {
        *activation_distribution.entry(n.activation.clone()).or_insert(0) += 1;
        *aggregator_distribution.entry(n.aggregator.clone()).or_insert(0) += 1;
    }

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for n in &neurons {
        n.id.hash(&mut hasher);
        n.activation.hash(&mut hasher);
        n.aggregator.hash(&mut hasher);
    }
    for s in &synapses {
        s.id.hash(&mut hasher);
        s.source.hash(&mut hasher);
        s.target.hash(&mut hasher);
        s.recurrent.hash(&mut hasher);
    }
    let mut sensors: Vec<_> = genome.sensor_ids.iter().collect();
    sensors.sort();
    let mut actuators: Vec<_> = genome.actuator_ids.iter().collect();
    actuators.sort();
    sensors.hash(&mut hasher);
    actuators.hash(&mut hasher);

    let fingerprint = format!("{:016x}", hasher.finish());

    GenomeSignature {
        fingerprint,
        total_neurons: neurons.len(),
        total_synapses: synapses.len(),
        total_recurrent_synapses: synapses.iter().filter(|s| s.recurrent).count(),
        total_sensors: genome.sensor_ids.len(),
        total_actuators: genome.actuator_ids.len(),
        activation_distribution,
        aggregator_distribution,
    }
}

#[inline]
fn normalized_abs_diff(weight: f64, a: usize, b: usize) -> f64 {
    if a == 0 && b == 0 {
        return 0.0;
    }
    let (a, b) = (a as f64, b as f64);
    weight * (a - b).abs() / a.max(b)
}

/// L1 distance between two proportion distributions over the union of keys.
fn l1_distribution_distance(a: &BTreeMap<String, usize>, b: &BTreeMap<String, usize>) -> f64 {
    let total_a: usize = a.values().sum();
    let total_b: usize = b.values().sum();
    if total_a == 0 && total_b == 0 {
        return 0.0;
    }

    let keys: std::collections::BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    keys.into_iter()
        .map(|k| {
            let pa = a.get(k).copied().unwrap_or(0) as f64 / total_a.max(1) as f64;
            let pb = b.get(k).copied().unwrap_or(0) as f64 / total_b.max(1) as f64;
            (pa - pb).abs()
        })
        .sum()
}

/// The compatibility distance between two genomes: a weighted sum of
/// normalized structural differences plus L1 distance over activation and
/// aggregator proportions. Always non-negative; zero for identical topology.
pub fn distance(a: &Genome, b: &Genome) -> f64 {
    let sig_a = signature(a);
    let sig_b = signature(b);

    let mut total = 0.0;
    total += normalized_abs_diff(1.0, sig_a.total_neurons, sig_b.total_neurons);
    total += normalized_abs_diff(1.0, sig_a.total_synapses, sig_b.total_synapses);
    total += normalized_abs_diff(
        0.5,
        sig_a.total_recurrent_synapses,
        sig_b.total_recurrent_synapses,
    );
    total += normalized_abs_diff(0.3, sig_a.total_sensors, sig_b.total_sensors);
    total += normalized_abs_diff(0.3, sig_a.total_actuators, sig_b.total_actuators);

    total += l1_distribution_distance(&sig_a.activation_distribution, &sig_b.activation_distribution);
    total += l1_distribution_distance(&sig_a.aggregator_distribution, &sig_b.aggregator_distribution);

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neuron(id: u64, activation: &str) -> crate::genome::Neuron {
        crate::genome::Neuron {
            id,
            activation: activation.to_string(),
            aggregator: "sum".to_string(),
        }
    }

    #[test]
    fn identical_topology_yields_zero_distance_and_matching_fingerprint() {
        let mut a = Genome::new("a");
        a.neurons.push(neuron(1, "tanh"));
        a.neurons.push(neuron(2, "relu"));

        let mut b = Genome::new("b");
        b.neurons.push(neuron(2, "relu"));
        b.neurons.push(neuron(1, "tanh"));

        assert_eq!(signature(&a).fingerprint, signature(&b).fingerprint);
        assert_eq!(distance(&a, &b), 0.0);
    }

    #[test]
    fn differing_topology_yields_positive_distance() {
        let mut a = Genome::new("a");
        a.neurons.push(neuron(1, "tanh"));

        let mut b = Genome::new("b");
        b.neurons.push(neuron(1, "tanh"));
        b.neurons.push(neuron(2, "relu"));

        assert!(distance(&a, &b) > 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let mut a = Genome::new("a");
        a.neurons.push(neuron(1, "tanh"));
        a.synapses.push(crate::genome::Synapse {
            id: 1,
            source: 1,
            target: 1,
            recurrent: true,
        });

        let b = Genome::new("b");

        assert_eq!(distance(&a, &b), distance(&b, &a));
    }
}

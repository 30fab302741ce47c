use rand::RngCore;

/// Decides how many mutation steps apply to a child genome (C4).
///
/// Every variant's result is floored at 1 and, when `max_count > 0`, capped
/// to it.
#[derive(Debug, Clone, Copy)]
pub enum MutationCountPolicy {
    Const(usize),
    NCountLinear { multiplier: f64, max_count: usize },
    NCountExponential { power: f64, max_count: usize },
}

impl MutationCountPolicy {
    /// `rng` is accepted so stochastic variants may vary their output; the
    /// built-in variants here are deterministic given `neuron_count`.
    pub fn count(&self, neuron_count: usize, _rng: &mut dyn RngCore) -> usize {
        let raw = match self {
            MutationCountPolicy::Const(k) => return (*k).max(1),
            MutationCountPolicy::NCountLinear { multiplier, .. } => {
                (neuron_count as f64 * multiplier).round()
            }
            MutationCountPolicy::NCountExponential { power, .. } => {
                (neuron_count as f64).powf(*power).round()
            }
        };

        let floored = (raw.max(1.0)) as usize;
        match self.max_count() {
            Some(max) if max > 0 => floored.min(max),
            _ => floored,
        }
    }

    fn max_count(&self) -> Option<usize> {
        match self {
            MutationCountPolicy::Const(_) => None,
            MutationCountPolicy::NCountLinear { max_count, .. } => Some(*max_count),
            MutationCountPolicy::NCountExponential { max_count, .. } => Some(*max_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn const_policy_ignores_neuron_count() {
        let mut rng = SmallRng::seed_from_u64(1);
        let policy = MutationCountPolicy::Const(3);
        assert_eq!(policy.count(0, &mut rng), 3);
        assert_eq!(policy.count(100, &mut rng), 3);
    }

    #[test]
    fn linear_policy_floors_at_one_and_caps() {
        let mut rng = SmallRng::seed_from_u64(1);
        let policy = MutationCountPolicy::NCountLinear {
            multiplier: 0.1,
            max_count: 2,
        };
        assert_eq!(policy.count(1, &mut rng), 1);
        assert_eq!(policy.count(100, &mut rng), 2);
    }

    #[test]
    fn exponential_policy_uncapped_when_max_is_zero() {
        let mut rng = SmallRng::seed_from_u64(1);
        let policy = MutationCountPolicy::NCountExponential {
            power: 1.0,
            max_count: 0,
        };
        assert_eq!(policy.count(7, &mut rng), 7);
    }
}

use rand::Rng;
use rand::RngCore;

/// A single weighted draw over non-negative `weights`. Falls back to a
/// uniform draw when every weight is non-positive or non-finite — the
/// degenerate case every weighted consumer in this workspace (selectors,
/// the mutation chooser) needs to handle the same way.
pub fn weighted_pick(rng: &mut dyn RngCore, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if !total.is_finite() || total <= 0.0 {
        return rng.random_range(0..weights.len());
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (idx, &w) in weights.iter().enumerate() {
        if w.is_finite() && w > 0.0 {
            cumulative += w;
            if cumulative >= target {
                return idx;
            }
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn zero_weight_entries_are_never_selected() {
        let mut rng = SmallRng::seed_from_u64(0);
        let weights = [0.0, 1.0, 0.0];
        for _ in 0..20 {
            assert_eq!(weighted_pick(&mut rng, &weights), 1);
        }
    }

    #[test]
    fn falls_back_to_uniform_when_all_zero() {
        let mut rng = SmallRng::seed_from_u64(0);
        let weights = [0.0, 0.0, 0.0];
        assert!(weighted_pick(&mut rng, &weights) < weights.len());
    }
}

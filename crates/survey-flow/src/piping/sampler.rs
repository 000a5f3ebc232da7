use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Source of randomness for brand sampling.
pub trait Sampler: Send {
    /// Reorders `values` in place.
    fn shuffle(&mut self, values: &mut [String]);
}

/// Fisher-Yates shuffle over a seedable RNG.
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Sampler for RandomSampler {
    fn shuffle(&mut self, values: &mut [String]) {
        values.shuffle(&mut self.rng);
    }
}

/// Keeps the incoming order; samples become prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedSampler;

impl Sampler for OrderedSampler {
    fn shuffle(&mut self, _values: &mut [String]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sampler_is_reproducible() {
        let base: Vec<String> = (1..=10).map(|n| n.to_string()).collect();
        let mut first = base.clone();
        let mut second = base.clone();
        RandomSampler::seeded(7).shuffle(&mut first);
        RandomSampler::seeded(7).shuffle(&mut second);
        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort_by_key(|value| value.parse::<u32>().unwrap_or(0));
        assert_eq!(sorted, base);
    }
}

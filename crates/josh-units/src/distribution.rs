//! Realized and virtual distributions.

use crate::error::UnitsError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// A sampler used by a [`Distribution::Virtual`] value.
///
/// Takes an RNG so sampling is deterministic when seeded; the engine owns
/// the RNG instance, the sampler just describes how to draw one value.
pub type Sampler = Arc<dyn Fn(&mut ChaCha8Rng) -> f64 + Send + Sync>;

/// A distribution of numeric values.
///
/// `spec.md` §3 and §4.A: a realized distribution is a finite sequence; a
/// virtual distribution defers sampling until realized, at which point
/// `sample()` is invoked once per requested element.
#[derive(Clone)]
pub enum Distribution {
    /// A finite, already-materialized sequence of values.
    Realized(Vec<f64>),
    /// A lazy sampler, realized on demand.
    Virtual(Sampler),
}

impl std::fmt::Debug for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Realized(values) => f.debug_tuple("Realized").field(values).finish(),
            Self::Virtual(_) => f.debug_tuple("Virtual").field(&"<sampler>").finish(),
        }
    }
}

impl PartialEq for Distribution {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Realized(a), Self::Realized(b)) => a == b,
            _ => false,
        }
    }
}

impl Distribution {
    /// Realize this distribution into a finite sequence of `n` values.
    ///
    /// If already realized, returns the realized values unchanged
    /// (`n` is ignored — a realized distribution's size is fixed).
    /// If virtual, invokes the sampler `n` times, in order.
    pub fn realize(&self, n: usize, rng: &mut ChaCha8Rng) -> Vec<f64> {
        match self {
            Self::Realized(values) => values.clone(),
            Self::Virtual(sampler) => (0..n).map(|_| sampler(rng)).collect(),
        }
    }

    /// Element-wise binary op against a scalar, broadcasting the scalar
    /// across every element. Only defined for realized distributions;
    /// virtual distributions must be realized first by the caller.
    fn map_realized(values: &[f64], scalar: f64, op: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        values.iter().map(|&v| op(v, scalar)).collect()
    }

    /// `distribution + scalar`, element-wise.
    pub fn add_scalar(&self, scalar: f64) -> Distribution {
        match self {
            Self::Realized(v) => Self::Realized(Self::map_realized(v, scalar, |a, b| a + b)),
            Self::Virtual(_) => self.clone(),
        }
    }

    /// `distribution - scalar`, element-wise.
    pub fn sub_scalar(&self, scalar: f64) -> Distribution {
        match self {
            Self::Realized(v) => Self::Realized(Self::map_realized(v, scalar, |a, b| a - b)),
            Self::Virtual(_) => self.clone(),
        }
    }

    /// `distribution * scalar`, element-wise.
    pub fn mul_scalar(&self, scalar: f64) -> Distribution {
        match self {
            Self::Realized(v) => Self::Realized(Self::map_realized(v, scalar, |a, b| a * b)),
            Self::Virtual(_) => self.clone(),
        }
    }

    /// `distribution / scalar`, element-wise.
    pub fn div_scalar(&self, scalar: f64) -> Result<Distribution, UnitsError> {
        if scalar == 0.0 {
            return Err(UnitsError::DivideByZero);
        }
        match self {
            Self::Realized(v) => Ok(Self::Realized(Self::map_realized(v, scalar, |a, b| a / b))),
            Self::Virtual(_) => Ok(self.clone()),
        }
    }

    /// `distribution ^ scalar`, element-wise.
    pub fn pow_scalar(&self, scalar: f64) -> Distribution {
        match self {
            Self::Realized(v) => Self::Realized(Self::map_realized(v, scalar, f64::powf)),
            Self::Virtual(_) => self.clone(),
        }
    }

    /// `scalar ^ distribution`, element-wise (reverse power).
    pub fn pow_reverse_scalar(&self, scalar: f64) -> Distribution {
        match self {
            Self::Realized(v) => {
                Self::Realized(Self::map_realized(v, scalar, |a, b| b.powf(a)))
            }
            Self::Virtual(_) => self.clone(),
        }
    }

    fn realized_values(&self) -> Option<&[f64]> {
        match self {
            Self::Realized(v) => Some(v),
            Self::Virtual(_) => None,
        }
    }

    /// Arithmetic mean. Fails on an empty realized distribution.
    pub fn mean(&self) -> Result<f64, UnitsError> {
        let values = self.realized_values().unwrap_or(&[]);
        if values.is_empty() {
            return Err(UnitsError::EmptyDistribution);
        }
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Population standard deviation. Fails on an empty realized
    /// distribution.
    pub fn std(&self) -> Result<f64, UnitsError> {
        let values = self.realized_values().unwrap_or(&[]);
        if values.is_empty() {
            return Err(UnitsError::EmptyDistribution);
        }
        let mean = self.mean()?;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Ok(variance.sqrt())
    }

    /// Minimum element. Fails on an empty realized distribution.
    pub fn min(&self) -> Result<f64, UnitsError> {
        let values = self.realized_values().unwrap_or(&[]);
        values
            .iter()
            .copied()
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
            .ok_or(UnitsError::EmptyDistribution)
    }

    /// Maximum element. Fails on an empty realized distribution.
    pub fn max(&self) -> Result<f64, UnitsError> {
        let values = self.realized_values().unwrap_or(&[]);
        values
            .iter()
            .copied()
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
            .ok_or(UnitsError::EmptyDistribution)
    }

    /// Sum of all elements. Fails on an empty realized distribution.
    pub fn sum(&self) -> Result<f64, UnitsError> {
        let values = self.realized_values().unwrap_or(&[]);
        if values.is_empty() {
            return Err(UnitsError::EmptyDistribution);
        }
        Ok(values.iter().sum())
    }

    /// Median of the elements. Fails on an empty realized distribution.
    pub fn median(&self) -> Result<f64, UnitsError> {
        self.percentile(0.5)
    }

    /// Linear-interpolated percentile, `p` in `[0, 1]`. Fails on an empty
    /// realized distribution.
    pub fn percentile(&self, p: f64) -> Result<f64, UnitsError> {
        let values = self.realized_values().unwrap_or(&[]);
        if values.is_empty() {
            return Err(UnitsError::EmptyDistribution);
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        if sorted.len() == 1 {
            return Ok(sorted[0]);
        }
        let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        if lo == hi {
            return Ok(sorted[lo]);
        }
        let frac = rank - lo as f64;
        Ok(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
    }

    /// Sample `n` values with replacement (unbounded: any `n` is valid).
    pub fn sample_with_replacement(&self, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        match self {
            Self::Realized(values) if !values.is_empty() => (0..n)
                .map(|_| values[rng.random_range(0..values.len())])
                .collect(),
            Self::Realized(_) => Vec::new(),
            Self::Virtual(sampler) => (0..n).map(|_| sampler(&mut rng)).collect(),
        }
    }

    /// Sample `n` values without replacement. Fails if `n` exceeds the
    /// population for a realized distribution.
    pub fn sample_without_replacement(
        &self,
        n: usize,
        seed: u64,
    ) -> Result<Vec<f64>, UnitsError> {
        match self {
            Self::Realized(values) => {
                if n > values.len() {
                    return Err(UnitsError::SampleWithoutReplacementExceedsPopulation {
                        requested: n,
                        population: values.len(),
                    });
                }
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut pool = values.clone();
                let mut drawn = Vec::with_capacity(n);
                for _ in 0..n {
                    let idx = rng.random_range(0..pool.len());
                    drawn.push(pool.swap_remove(idx));
                }
                Ok(drawn)
            }
            Self::Virtual(sampler) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                Ok((0..n).map(|_| sampler(&mut rng)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions_fail_on_empty() {
        let d = Distribution::Realized(Vec::new());
        assert_eq!(d.mean(), Err(UnitsError::EmptyDistribution));
        assert_eq!(d.std(), Err(UnitsError::EmptyDistribution));
        assert_eq!(d.min(), Err(UnitsError::EmptyDistribution));
        assert_eq!(d.max(), Err(UnitsError::EmptyDistribution));
        assert_eq!(d.sum(), Err(UnitsError::EmptyDistribution));
    }

    #[test]
    fn mean_and_sum() {
        let d = Distribution::Realized(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(d.sum(), Ok(10.0));
        assert_eq!(d.mean(), Ok(2.5));
    }

    #[test]
    fn without_replacement_rejects_oversized_request() {
        let d = Distribution::Realized(vec![1.0, 2.0]);
        assert_eq!(
            d.sample_without_replacement(3, 0),
            Err(UnitsError::SampleWithoutReplacementExceedsPopulation {
                requested: 3,
                population: 2,
            })
        );
    }

    #[test]
    fn without_replacement_never_repeats() {
        let d = Distribution::Realized(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let drawn = d.sample_without_replacement(5, 42).unwrap();
        let mut sorted = drawn.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn virtual_realize_invokes_sampler_n_times() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let d = Distribution::Virtual(Arc::new(move |_rng| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            1.0
        }));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let values = d.realize(7, &mut rng);
        assert_eq!(values.len(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }
}

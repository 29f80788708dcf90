//! Scalar distributions sampled by probability fields

use crate::error::{XenakisError, XenakisResult};
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::Rng;
use std::f64::consts::TAU;

/// A bound sampling rule
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    /// Uniform over `[low, high]`
    Uniform { low: f64, high: f64 },
    /// Gaussian with the given mean and standard deviation
    Normal { mean: f64, std_dev: f64 },
    /// Exponential with the given rate (mean `1 / rate`)
    Exponential { rate: f64 },
    /// Weighted choice over discrete values
    Categorical {
        values: Vec<f64>,
        cumulative_weights: Vec<f64>,
    },
}

impl Distribution {
    pub fn uniform(low: f64, high: f64) -> XenakisResult<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(XenakisError::InvalidDistribution(format!(
                "uniform bounds must be finite, got [{}, {}]",
                low, high
            )));
        }
        if low > high {
            return Err(XenakisError::InvalidDistribution(format!(
                "uniform lower bound {} exceeds upper bound {}",
                low, high
            )));
        }
        if !(high - low).is_finite() {
            return Err(XenakisError::InvalidDistribution(format!(
                "uniform width of [{}, {}] overflows",
                low, high
            )));
        }
        Ok(Distribution::Uniform { low, high })
    }

    pub fn normal(mean: f64, std_dev: f64) -> XenakisResult<Self> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
            return Err(XenakisError::InvalidDistribution(format!(
                "normal needs a finite mean and a finite sigma >= 0, got mu={} sigma={}",
                mean, std_dev
            )));
        }
        Ok(Distribution::Normal { mean, std_dev })
    }

    pub fn exponential(rate: f64) -> XenakisResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(XenakisError::InvalidDistribution(format!(
                "exponential rate must be finite and positive, got {}",
                rate
            )));
        }
        Ok(Distribution::Exponential { rate })
    }

    /// Weighted discrete choice; equal weights when `weights` is `None`
    pub fn categorical(values: &[f64], weights: Option<&[f64]>) -> XenakisResult<Self> {
        if values.is_empty() {
            return Err(XenakisError::InvalidDistribution(
                "categorical needs at least one value".to_string(),
            ));
        }

        let weights: Vec<f64> = match weights {
            Some(w) if w.len() != values.len() => {
                return Err(XenakisError::InvalidDistribution(format!(
                    "categorical has {} values but {} weights",
                    values.len(),
                    w.len()
                )))
            }
            Some(w) => w.to_vec(),
            None => vec![1.0; values.len()],
        };

        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(XenakisError::InvalidDistribution(
                "categorical weights must be finite and non-negative".to_string(),
            ));
        }

        let cumulative_weights: Vec<f64> = weights
            .iter()
            .scan(0.0, |acc, w| {
                *acc += w;
                Some(*acc)
            })
            .collect();

        let total = cumulative_weights.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return Err(XenakisError::InvalidDistribution(
                "categorical weights sum to zero".to_string(),
            ));
        }
        if !total.is_finite() {
            return Err(XenakisError::InvalidDistribution(
                "categorical weights overflow when summed".to_string(),
            ));
        }

        Ok(Distribution::Categorical {
            values: values.to_vec(),
            cumulative_weights,
        })
    }

    /// Draw one value from `rng`
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Distribution::Uniform { low, high } => {
                if low == high {
                    *low
                } else {
                    rng.gen_range(*low..=*high)
                }
            }
            Distribution::Normal { mean, std_dev } => {
                // Box-Muller; u1 stays away from zero so ln is finite
                let u1: f64 = rng.sample(Open01);
                let u2: f64 = rng.gen();
                let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
                mean + std_dev * z
            }
            Distribution::Exponential { rate } => {
                let u: f64 = rng.sample(Open01);
                -u.ln() / rate
            }
            Distribution::Categorical {
                values,
                cumulative_weights,
            } => {
                let total = cumulative_weights[cumulative_weights.len() - 1];
                let r = rng.gen_range(0.0..total);
                // first bucket whose upper edge lies above r; zero-width buckets are skipped
                let idx = cumulative_weights.partition_point(|&acc| acc <= r);
                values[idx.min(values.len() - 1)]
            }
        }
    }

    /// Expected value
    pub fn mean(&self) -> f64 {
        match self {
            Distribution::Uniform { low, high } => (low + high) / 2.0,
            Distribution::Normal { mean, .. } => *mean,
            Distribution::Exponential { rate } => 1.0 / rate,
            Distribution::Categorical {
                values,
                cumulative_weights,
            } => {
                let total = cumulative_weights[cumulative_weights.len() - 1];
                let mut prev = 0.0;
                values
                    .iter()
                    .zip(cumulative_weights)
                    .map(|(v, acc)| {
                        let w = acc - prev;
                        prev = *acc;
                        v * w / total
                    })
                    .sum()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_uniform_stays_in_bounds() {
        let dist = Distribution::uniform(2.0, 3.0).unwrap();
        let mut r = rng(1);
        for _ in 0..1000 {
            let v = dist.sample(&mut r);
            assert!((2.0..=3.0).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_uniform() {
        let dist = Distribution::uniform(5.0, 5.0).unwrap();
        assert_eq!(dist.sample(&mut rng(2)), 5.0);
    }

    #[test]
    fn test_normal_mean_is_close() {
        let dist = Distribution::normal(60.0, 5.0).unwrap();
        let mut r = rng(3);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| dist.sample(&mut r)).sum::<f64>() / n as f64;
        assert!((mean - 60.0).abs() < 0.2, "sample mean {}", mean);
    }

    #[test]
    fn test_exponential_mean_is_inverse_rate() {
        let dist = Distribution::exponential(2.0).unwrap();
        let mut r = rng(4);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| dist.sample(&mut r)).collect();
        assert!(samples.iter().all(|&v| v > 0.0));
        let mean = samples.iter().sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "sample mean {}", mean);
    }

    #[test]
    fn test_categorical_only_returns_values() {
        let dist = Distribution::categorical(&[10.0, 20.0, 30.0], None).unwrap();
        let mut r = rng(5);
        for _ in 0..500 {
            let v = dist.sample(&mut r);
            assert!(v == 10.0 || v == 20.0 || v == 30.0);
        }
    }

    #[test]
    fn test_categorical_respects_weights() {
        let dist = Distribution::categorical(&[0.0, 1.0], Some(&[3.0, 1.0])).unwrap();
        let mut r = rng(6);
        let n = 20_000;
        let ones = (0..n).filter(|_| dist.sample(&mut r) == 1.0).count();
        let share = ones as f64 / n as f64;
        assert!((share - 0.25).abs() < 0.02, "share of ones {}", share);
        assert!((dist.mean() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weight_value_never_drawn() {
        let dist = Distribution::categorical(&[1.0, 2.0, 3.0], Some(&[1.0, 0.0, 1.0])).unwrap();
        let mut r = rng(7);
        assert!((0..2000).all(|_| dist.sample(&mut r) != 2.0));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Distribution::uniform(3.0, 1.0).is_err());
        assert!(Distribution::uniform(f64::NAN, 1.0).is_err());
        assert!(Distribution::normal(0.0, -1.0).is_err());
        assert!(Distribution::exponential(0.0).is_err());
        assert!(Distribution::categorical(&[], None).is_err());
        assert!(Distribution::categorical(&[1.0], Some(&[1.0, 2.0])).is_err());
        assert!(Distribution::categorical(&[1.0, 2.0], Some(&[0.0, 0.0])).is_err());
    }

    #[test]
    fn test_overflowing_ranges_rejected() {
        assert!(matches!(
            Distribution::uniform(-f64::MAX, f64::MAX),
            Err(XenakisError::InvalidDistribution(_))
        ));
        assert!(matches!(
            Distribution::categorical(&[1.0, 2.0], Some(&[f64::MAX, f64::MAX])),
            Err(XenakisError::InvalidDistribution(_))
        ));

        // widest accepted ranges still sample
        let wide = Distribution::uniform(-f64::MAX / 2.0, f64::MAX / 2.0).unwrap();
        assert!(wide.sample(&mut rng(8)).is_finite());
        let heavy = Distribution::categorical(&[1.0, 2.0], Some(&[f64::MAX / 4.0, f64::MAX / 4.0])).unwrap();
        let v = heavy.sample(&mut rng(9));
        assert!(v == 1.0 || v == 2.0);
        assert!(Distribution::categorical(&[1.0], Some(&[-1.0])).is_err());
    }
}

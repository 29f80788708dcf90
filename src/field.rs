//! Probability fields
//!
//! A field owns a distribution and its own random stream, and turns them
//! into one scalar per query time. Three optional stages shape the value:
//!
//! 1. **Sample and hold**: within `hold_seconds` of the last fresh draw the
//!    previous base value is reused instead of sampling again.
//! 2. **Jitter**: a fresh uniform offset in `[-jitter, +jitter]`, applied on
//!    every call, held or not.
//! 3. **Clip**: the result is clamped into a fixed range.

use crate::distribution::Distribution;
use crate::error::{XenakisError, XenakisResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sample-and-hold memory of a field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldState {
    pub last_value: Option<f64>,
    pub last_sample_time: f64,
}

impl Default for HoldState {
    fn default() -> Self {
        Self {
            last_value: None,
            last_sample_time: f64::NEG_INFINITY,
        }
    }
}

/// Stateful scalar sampler
#[derive(Debug, Clone)]
pub struct ProbabilityField {
    distribution: Distribution,
    rng: StdRng,
    hold_seconds: Option<f64>,
    jitter: f64,
    clip: Option<(f64, f64)>,
    state: HoldState,
}

impl ProbabilityField {
    /// Wrap a distribution with an explicit random stream
    pub fn new(distribution: Distribution, rng: StdRng) -> Self {
        Self {
            distribution,
            rng,
            hold_seconds: None,
            jitter: 0.0,
            clip: None,
            state: HoldState::default(),
        }
    }

    pub fn seeded(distribution: Distribution, seed: u64) -> Self {
        Self::new(distribution, StdRng::seed_from_u64(seed))
    }

    pub fn uniform(low: f64, high: f64, seed: u64) -> XenakisResult<Self> {
        Ok(Self::seeded(Distribution::uniform(low, high)?, seed))
    }

    pub fn normal(mean: f64, std_dev: f64, seed: u64) -> XenakisResult<Self> {
        Ok(Self::seeded(Distribution::normal(mean, std_dev)?, seed))
    }

    /// Exponential field with mean `1 / rate`
    pub fn exponential(rate: f64, seed: u64) -> XenakisResult<Self> {
        Ok(Self::seeded(Distribution::exponential(rate)?, seed))
    }

    pub fn categorical(values: &[f64], weights: Option<&[f64]>, seed: u64) -> XenakisResult<Self> {
        Ok(Self::seeded(Distribution::categorical(values, weights)?, seed))
    }

    /// Field that always returns `value`
    pub fn constant(value: f64) -> XenakisResult<Self> {
        Ok(Self::seeded(Distribution::uniform(value, value)?, 0))
    }

    /// Reuse the base value for `seconds` after each fresh draw
    pub fn with_hold(mut self, seconds: f64) -> XenakisResult<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(XenakisError::InvalidDistribution(format!(
                "hold must be a finite number of seconds >= 0, got {}",
                seconds
            )));
        }
        self.hold_seconds = Some(seconds);
        Ok(self)
    }

    pub fn with_jitter(mut self, amplitude: f64) -> XenakisResult<Self> {
        if !(2.0 * amplitude).is_finite() || amplitude < 0.0 {
            return Err(XenakisError::InvalidDistribution(format!(
                "jitter amplitude must be >= 0 with a finite span, got {}",
                amplitude
            )));
        }
        self.jitter = amplitude;
        Ok(self)
    }

    pub fn with_clip(mut self, low: f64, high: f64) -> XenakisResult<Self> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(XenakisError::InvalidDistribution(format!(
                "clip range [{}, {}] is empty",
                low, high
            )));
        }
        self.clip = Some((low, high));
        Ok(self)
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    /// Draw the field's value at time `now` (seconds)
    pub fn draw(&mut self, now: f64) -> f64 {
        let held = match (self.hold_seconds, self.state.last_value) {
            (Some(hold), Some(last)) if now - self.state.last_sample_time < hold => Some(last),
            _ => None,
        };

        let mut value = match held {
            Some(last) => last,
            None => {
                let fresh = self.distribution.sample(&mut self.rng);
                self.state = HoldState {
                    last_value: Some(fresh),
                    last_sample_time: now,
                };
                fresh
            }
        };

        if self.jitter > 0.0 {
            value += self.rng.gen_range(-self.jitter..=self.jitter);
        }

        if let Some((low, high)) = self.clip {
            value = value.clamp(low, high);
        }

        value
    }
}

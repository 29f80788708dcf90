//! Event timing for inhomogeneous Poisson processes
//!
//! `PoissonScheduler::next_time` uses Lewis-Shedler thinning: candidate gaps
//! come from a homogeneous process at `max_rate`, and each candidate time is
//! kept with probability `intensity(t) / max_rate`.
//!
//! `max_rate` has to bound the intensity over every time the scheduler
//! visits. That is the caller's job; an intensity above the bound is not
//! detected and only skews the accepted times toward those regions.

use crate::error::{XenakisError, XenakisResult};
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Time-varying event rate in events per second
pub type IntensityFn = Box<dyn Fn(f64) -> f64 + Send>;

pub struct PoissonScheduler {
    intensity: IntensityFn,
    max_rate: f64,
    rng: StdRng,
}

impl fmt::Debug for PoissonScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoissonScheduler")
            .field("max_rate", &self.max_rate)
            .finish_non_exhaustive()
    }
}

impl PoissonScheduler {
    pub fn new<F>(intensity: F, max_rate: f64, rng: StdRng) -> XenakisResult<Self>
    where
        F: Fn(f64) -> f64 + Send + 'static,
    {
        if !max_rate.is_finite() || max_rate <= 0.0 {
            return Err(XenakisError::InvalidScheduler(format!(
                "max_rate must be finite and positive, got {}",
                max_rate
            )));
        }
        Ok(Self {
            intensity: Box::new(intensity),
            max_rate,
            rng,
        })
    }

    pub fn seeded<F>(intensity: F, max_rate: f64, seed: u64) -> XenakisResult<Self>
    where
        F: Fn(f64) -> f64 + Send + 'static,
    {
        Self::new(intensity, max_rate, StdRng::seed_from_u64(seed))
    }

    /// Homogeneous process at `rate` events per second
    pub fn constant(rate: f64, rng: StdRng) -> XenakisResult<Self> {
        Self::new(move |_| rate, rate, rng)
    }

    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }

    pub fn intensity_at(&self, t: f64) -> f64 {
        (self.intensity)(t)
    }

    /// Next accepted event time, strictly after `t`
    pub fn next_time(&mut self, mut t: f64) -> f64 {
        loop {
            let u: f64 = self.rng.sample(Open01);
            let gap = -u.ln() / self.max_rate;
            // gaps below the float resolution of t advance by one ulp
            t = (t + gap).max(t.next_up());

            let accept: f64 = self.rng.gen();
            if accept <= (self.intensity)(t) / self.max_rate {
                return t;
            }
        }
    }
}

/// Slow sinusoidal density between `min` and `max` events per second
///
/// `min + (max - min) * (sin(t / period) / 2 + 1/2)`; `max` is the matching
/// thinning bound.
pub fn breathing_intensity(min: f64, max: f64, period: f64) -> impl Fn(f64) -> f64 + Send + 'static {
    move |t| {
        let x = (t / period).sin() * 0.5 + 0.5;
        min + (max - min) * x
    }
}

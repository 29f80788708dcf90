//! # Xenakis - Sieves and Stochastic Clouds
//!
//! Xenakis generates discrete note events from two composable sources:
//!
//! - **Sieves**: ordered unions, intersections and complements of residue
//!   classes, evaluated over an integer window with an adjustable shift
//! - **Stochastic clouds**: probability fields sampled at the times of an
//!   inhomogeneous Poisson process, with pitches snapped onto an allowed set
//!
//! The usual pipeline runs a sieve over a pitch window and hands the result
//! to a cloud as its allowed pitches.
//!
//! ## Quick Start
//!
//! ### Sieve
//!
//! ```rust
//! use xenakis::sieve::{Clause, Sieve};
//!
//! // 0 or 2 mod 5, minus everything that is 1 mod 3
//! let sieve = Sieve::new(vec![
//!     Clause::union(5, &[0, 2]).unwrap(),
//!     Clause::complement(3, &[1]).unwrap(),
//! ]);
//! assert_eq!(sieve.generate(0, 20), vec![0, 2, 5, 12, 15, 17, 20]);
//! assert_eq!(sieve.period(), 15);
//! ```
//!
//! ### Cloud constrained by a sieve
//!
//! ```rust
//! use xenakis::cloud::{CloudFields, StochasticCloud};
//! use xenakis::field::ProbabilityField;
//! use xenakis::scheduler::{breathing_intensity, PoissonScheduler};
//! use xenakis::sieve::{Clause, Sieve};
//!
//! let allowed = Sieve::new(vec![Clause::union(12, &[0, 2, 5, 7, 9]).unwrap()])
//!     .generate(36, 96);
//!
//! let fields = CloudFields {
//!     pitch: ProbabilityField::normal(66.0, 12.0, 1).unwrap().with_clip(36.0, 96.0).unwrap(),
//!     duration: ProbabilityField::exponential(2.0, 2).unwrap().with_clip(0.05, 2.5).unwrap(),
//!     velocity: ProbabilityField::normal(90.0, 25.0, 3).unwrap().with_clip(20.0, 127.0).unwrap(),
//!     channel: ProbabilityField::categorical(&[0.0, 1.0], Some(&[3.0, 1.0]), 4).unwrap(),
//! };
//! let scheduler = PoissonScheduler::seeded(breathing_intensity(0.5, 6.0, 10.0), 6.0, 2025).unwrap();
//!
//! let mut cloud = StochasticCloud::new(fields, scheduler)
//!     .with_allowed_pitches(allowed.iter().copied())
//!     .with_pitch_span(36, 96)
//!     .unwrap();
//!
//! let events = cloud.render_offline(0.0, 30.0);
//! assert!(events.iter().all(|e| allowed.contains(&e.pitch)));
//! ```
//!
//! ## Architecture
//!
//! - [`sieve`] - residue-class clauses, shift, period and tiling
//! - [`sieve_input`] - clause lists from JSON and command-line strings
//! - [`distribution`] - uniform, normal, exponential and categorical rules
//! - [`field`] - probability fields with sample-and-hold, jitter and clip
//! - [`scheduler`] - Poisson thinning for time-varying densities
//! - [`cloud`] - event drawing, pitch quantisation and the paced run loop
//! - [`sink`] - console, JSON, MIDI device and OSC consumers
//! - [`midi_file`] - Standard MIDI File export
//! - [`config`] - TOML output settings
//!
//! Every random component owns a seeded `StdRng`, so fixed seeds reproduce
//! the same events exactly.

pub mod cloud;
pub mod config;
pub mod distribution;
pub mod error;
pub mod field;
pub mod midi_file;
pub mod scheduler;
pub mod sieve;
pub mod sieve_input;
pub mod sink;

pub use cloud::{CloudEvent, CloudFields, RunOptions, StochasticCloud};
pub use error::{XenakisError, XenakisResult};
pub use field::ProbabilityField;
pub use scheduler::PoissonScheduler;
pub use sieve::{Clause, ClauseOp, Sieve};
pub use sink::EventSink;

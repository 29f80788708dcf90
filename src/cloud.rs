//! Stochastic event clouds
//!
//! A cloud combines four probability fields (pitch, duration, velocity and
//! channel) with a Poisson scheduler. Each scheduled time yields one
//! `CloudEvent`. When an allowed pitch set is configured, usually the output
//! of a sieve, sampled pitches snap to its nearest member.

use crate::error::{XenakisError, XenakisResult};
use crate::field::ProbabilityField;
use crate::scheduler::PoissonScheduler;
use crate::sink::EventSink;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Shortest duration an event may carry
pub const MIN_DURATION_SECONDS: f64 = 0.01;

pub const VELOCITY_RANGE: (i64, i64) = (1, 127);
pub const CHANNEL_RANGE: (i64, i64) = (0, 15);

/// One generated note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    /// Absolute start time in seconds
    pub t0: f64,
    pub pitch: i64,
    pub duration_seconds: f64,
    pub velocity: u8,
    pub channel: u8,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl CloudEvent {
    pub fn end_time(&self) -> f64 {
        self.t0 + self.duration_seconds
    }

    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Wall-clock source and suspension point for `StochasticCloud::run`
pub trait Clock {
    /// Current time in seconds
    fn now(&self) -> f64;
    /// Block for `seconds`
    fn sleep(&mut self, seconds: f64);
}

/// Seconds since the UNIX epoch, paced with `thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    fn sleep(&mut self, seconds: f64) {
        if seconds > 0.0 && seconds.is_finite() {
            std::thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}

/// Stop conditions for `StochasticCloud::run`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunOptions {
    /// Cursor start; the clock's current time when `None`
    pub t_start: Option<f64>,
    /// Stop once the cursor reaches this time
    pub t_end: Option<f64>,
    /// Stop after this many delivered events
    pub max_events: Option<usize>,
}

/// The four fields a cloud samples per event
#[derive(Debug, Clone)]
pub struct CloudFields {
    pub pitch: ProbabilityField,
    pub duration: ProbabilityField,
    pub velocity: ProbabilityField,
    pub channel: ProbabilityField,
}

#[derive(Debug)]
pub struct StochasticCloud {
    fields: CloudFields,
    scheduler: PoissonScheduler,
    allowed_pitches: Option<Vec<i64>>,
    pitch_quantise: bool,
    pitch_span: (i64, i64),
}

impl StochasticCloud {
    /// Cloud with quantisation on, no allowed set and a MIDI pitch span
    pub fn new(fields: CloudFields, scheduler: PoissonScheduler) -> Self {
        Self {
            fields,
            scheduler,
            allowed_pitches: None,
            pitch_quantise: true,
            pitch_span: (0, 127),
        }
    }

    /// Constrain pitches to `pitches`, sorted and deduplicated here
    pub fn with_allowed_pitches<I: IntoIterator<Item = i64>>(mut self, pitches: I) -> Self {
        let mut allowed: Vec<i64> = pitches.into_iter().collect();
        allowed.sort_unstable();
        allowed.dedup();
        self.allowed_pitches = Some(allowed);
        self
    }

    pub fn with_pitch_quantise(mut self, quantise: bool) -> Self {
        self.pitch_quantise = quantise;
        self
    }

    pub fn with_pitch_span(mut self, low: i64, high: i64) -> XenakisResult<Self> {
        if low > high {
            return Err(XenakisError::InvalidCloud(format!(
                "pitch span [{}, {}] is empty",
                low, high
            )));
        }
        self.pitch_span = (low, high);
        Ok(self)
    }

    pub fn allowed_pitches(&self) -> Option<&[i64]> {
        self.allowed_pitches.as_deref()
    }

    pub fn pitch_span(&self) -> (i64, i64) {
        self.pitch_span
    }

    /// Round, clamp into the span, then snap to the allowed set
    pub fn quantise_pitch(&self, raw: f64) -> i64 {
        let clamped = round_to_int(raw).clamp(self.pitch_span.0, self.pitch_span.1);

        match self.allowed_pitches.as_deref() {
            Some(allowed) if self.pitch_quantise && !allowed.is_empty() => {
                nearest_allowed(allowed, clamped)
            }
            _ => clamped,
        }
    }

    /// Sample every field at `now` and build an event starting there
    pub fn draw_event(&mut self, now: f64) -> CloudEvent {
        let raw_pitch = self.fields.pitch.draw(now);
        let raw_duration = self.fields.duration.draw(now);
        let raw_velocity = self.fields.velocity.draw(now);
        let raw_channel = self.fields.channel.draw(now);

        CloudEvent {
            t0: now,
            pitch: self.quantise_pitch(raw_pitch),
            duration_seconds: raw_duration.max(MIN_DURATION_SECONDS),
            velocity: round_to_int(raw_velocity).clamp(VELOCITY_RANGE.0, VELOCITY_RANGE.1) as u8,
            channel: round_to_int(raw_channel).clamp(CHANNEL_RANGE.0, CHANNEL_RANGE.1) as u8,
            metadata: BTreeMap::new(),
        }
    }

    /// Deliver events to `sink` in step with `clock`
    ///
    /// The cursor starts at `options.t_start` (or `clock.now()`) and advances
    /// through the scheduler. Before each draw the loop sleeps until the
    /// scheduled time if it lies ahead of the clock. Returns the number of
    /// delivered events.
    pub fn run<S, C>(&mut self, sink: &mut S, options: RunOptions, clock: &mut C) -> usize
    where
        S: EventSink + ?Sized,
        C: Clock + ?Sized,
    {
        let mut t = options.t_start.unwrap_or_else(|| clock.now());
        let mut delivered = 0usize;
        info!(
            t_start = t,
            t_end = ?options.t_end,
            max_events = ?options.max_events,
            "cloud run started"
        );

        loop {
            if options.t_end.is_some_and(|end| t >= end) {
                break;
            }
            if options.max_events.is_some_and(|max| delivered >= max) {
                break;
            }

            t = self.scheduler.next_time(t);
            let delay = t - clock.now();
            if delay > 0.0 {
                clock.sleep(delay);
            }

            let event = self.draw_event(t);
            debug!(
                t0 = event.t0,
                pitch = event.pitch,
                velocity = event.velocity,
                channel = event.channel,
                "cloud event"
            );
            sink.handle(&event);
            delivered += 1;
        }

        info!(delivered, "cloud run finished");
        delivered
    }

    /// `run` against the system clock
    pub fn run_realtime<S: EventSink + ?Sized>(&mut self, sink: &mut S, options: RunOptions) -> usize {
        self.run(sink, options, &mut SystemClock)
    }

    /// Events scheduled in `(t_start, t_start + duration]`, without pacing
    pub fn render_offline(&mut self, t_start: f64, duration: f64) -> Vec<CloudEvent> {
        let end = t_start + duration;
        let mut events = Vec::new();
        let mut t = t_start;
        loop {
            t = self.scheduler.next_time(t);
            if t > end {
                break;
            }
            events.push(self.draw_event(t));
        }
        info!(count = events.len(), duration, "offline cloud render");
        events
    }
}

/// Round half to even, saturating into `i64`
fn round_to_int(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Nearest member of a sorted, non-empty list; ties go to the lower one
fn nearest_allowed(allowed: &[i64], pitch: i64) -> i64 {
    let first = allowed[0];
    let last = allowed[allowed.len() - 1];
    if pitch <= first {
        return first;
    }
    if pitch >= last {
        return last;
    }

    let idx = allowed.partition_point(|&p| p < pitch);
    let below = allowed[idx - 1];
    let above = allowed[idx];
    if (pitch - below).abs() <= (above - pitch).abs() {
        below
    } else {
        above
    }
}

//! End-to-end: sieve -> cloud -> sinks and MIDI files

use midly::{MidiMessage, Smf, TrackEventKind};
use xenakis::cloud::{Clock, CloudFields, RunOptions, StochasticCloud};
use xenakis::field::ProbabilityField;
use xenakis::midi_file::{export_events, ExportSettings};
use xenakis::scheduler::{breathing_intensity, PoissonScheduler};
use xenakis::sieve::{Clause, Sieve};
use xenakis::sink::{CollectSink, EventSink, JsonLinesSink};
use xenakis::CloudEvent;

fn demo_cloud(seed: u64, allowed: &[i64]) -> StochasticCloud {
    let fields = CloudFields {
        pitch: ProbabilityField::normal(66.0, 12.0, seed)
            .unwrap()
            .with_clip(36.0, 96.0)
            .unwrap(),
        duration: ProbabilityField::exponential(2.0, seed + 1)
            .unwrap()
            .with_clip(0.05, 2.5)
            .unwrap(),
        velocity: ProbabilityField::normal(90.0, 25.0, seed + 2)
            .unwrap()
            .with_clip(20.0, 127.0)
            .unwrap(),
        channel: ProbabilityField::categorical(&[0.0, 1.0], Some(&[3.0, 1.0]), seed + 3).unwrap(),
    };
    let scheduler =
        PoissonScheduler::seeded(breathing_intensity(0.5, 6.0, 10.0), 6.0, seed + 4).unwrap();
    StochasticCloud::new(fields, scheduler)
        .with_allowed_pitches(allowed.iter().copied())
        .with_pitch_span(36, 96)
        .unwrap()
}

fn pentatonic() -> Vec<i64> {
    Sieve::new(vec![Clause::union(12, &[0, 2, 4, 7, 9]).unwrap()]).generate(36, 96)
}

/// Clock that never waits: sleeping just advances it
struct InstantClock(f64);

impl Clock for InstantClock {
    fn now(&self) -> f64 {
        self.0
    }

    fn sleep(&mut self, seconds: f64) {
        self.0 += seconds;
    }
}

#[test]
fn test_pitches_land_on_sieve() {
    let allowed = pentatonic();
    let events = demo_cloud(2025, &allowed).render_offline(0.0, 60.0);
    assert!(!events.is_empty());
    for ev in &events {
        assert!(allowed.contains(&ev.pitch), "pitch {} not allowed", ev.pitch);
        assert!((1..=127).contains(&ev.velocity));
        assert!(ev.channel <= 1);
        assert!(ev.duration_seconds >= 0.05 && ev.duration_seconds <= 2.5);
    }
}

#[test]
fn test_times_strictly_increase_within_window() {
    let events = demo_cloud(7, &pentatonic()).render_offline(5.0, 40.0);
    assert!(events.windows(2).all(|w| w[0].t0 < w[1].t0));
    assert!(events.iter().all(|e| e.t0 > 5.0 && e.t0 <= 45.0));
}

#[test]
fn test_same_seed_same_events() {
    let a = demo_cloud(99, &pentatonic()).render_offline(0.0, 30.0);
    let b = demo_cloud(99, &pentatonic()).render_offline(0.0, 30.0);
    assert_eq!(a, b);

    let c = demo_cloud(100, &pentatonic()).render_offline(0.0, 30.0);
    assert_ne!(a, c);
}

#[test]
fn test_run_matches_offline_render() {
    let allowed = pentatonic();
    let offline = demo_cloud(11, &allowed).render_offline(0.0, 1000.0);

    let mut sink = CollectSink::new();
    let mut clock = InstantClock(0.0);
    let count = demo_cloud(11, &allowed).run(
        &mut sink,
        RunOptions {
            t_start: Some(0.0),
            t_end: None,
            max_events: Some(25),
        },
        &mut clock,
    );

    assert_eq!(count, 25);
    assert_eq!(sink.events(), &offline[..25]);
    // The clock was paced up to the last event
    assert!((clock.now() - offline[24].t0).abs() < 1e-9);
}

#[test]
fn test_closure_sink_counts_channels() {
    let mut per_channel = [0usize; 16];
    {
        let mut sink = |ev: &CloudEvent| per_channel[ev.channel as usize] += 1;
        let mut clock = InstantClock(100.0);
        demo_cloud(3, &pentatonic()).run(
            &mut sink,
            RunOptions {
                t_start: None,
                t_end: Some(400.0),
                max_events: None,
            },
            &mut clock,
        );
        sink.finish().unwrap();
    }
    // Weights 3:1 favour channel 0
    assert!(per_channel[0] > per_channel[1]);
    assert!(per_channel[2..].iter().all(|&n| n == 0));
}

#[test]
fn test_json_lines_parse_back() {
    let events = demo_cloud(5, &pentatonic()).render_offline(0.0, 10.0);
    let mut sink = JsonLinesSink::new(Vec::new());
    for ev in &events {
        sink.handle(ev);
    }
    sink.finish().unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let parsed: Vec<CloudEvent> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed.len(), events.len());
    for (back, ev) in parsed.iter().zip(&events) {
        assert!((back.t0 - ev.t0).abs() < 1e-9);
        assert_eq!(back.pitch, ev.pitch);
        assert_eq!(back.velocity, ev.velocity);
        assert_eq!(back.channel, ev.channel);
    }
}

#[test]
fn test_exported_file_contains_every_note() {
    let events = demo_cloud(42, &pentatonic()).render_offline(0.0, 20.0);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloud.mid");
    export_events(&events, &ExportSettings::default(), &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    let mut note_ons = 0usize;
    let mut note_offs = 0usize;
    for track in &smf.tracks {
        for ev in track {
            if let TrackEventKind::Midi { message, .. } = ev.kind {
                match message {
                    MidiMessage::NoteOn { .. } => note_ons += 1,
                    MidiMessage::NoteOff { .. } => note_offs += 1,
                    _ => {}
                }
            }
        }
    }
    assert_eq!(note_ons, events.len());
    assert_eq!(note_offs, events.len());
}

//! Standard MIDI File export
//!
//! Cloud events become a format 1 file: track 0 carries the tempo, the
//! remaining tracks carry notes, either one track per MIDI channel or a
//! single shared track. Times are rebased on the earliest event and converted
//! to absolute ticks before deltas are taken, so rounding never accumulates.
//! At equal ticks note-offs are written before note-ons.
//!
//! Sieve step sequences are written as a single-track file with one fixed
//! step length per note.

use crate::cloud::CloudEvent;
use crate::error::{XenakisError, XenakisResult};
use crate::sink::midi_note;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const U28_MAX: u32 = 0x0FFF_FFFF;
const U24_MAX: u32 = 0x00FF_FFFF;

/// Note-on velocity for step sequences
const STEP_VELOCITY: u8 = 96;
/// Note-off velocity for step sequences
const STEP_RELEASE_VELOCITY: u8 = 64;

/// Tempo and layout of exported files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub bpm: f64,
    pub ticks_per_beat: u16,
    pub separate_tracks_by_channel: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            ticks_per_beat: 480,
            separate_tracks_by_channel: true,
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> XenakisResult<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(XenakisError::Config(format!(
                "bpm must be positive, got {}",
                self.bpm
            )));
        }
        if self.ticks_per_beat == 0 || self.ticks_per_beat > 0x7FFF {
            return Err(XenakisError::Config(format!(
                "ticks_per_beat must be in 1..=32767, got {}",
                self.ticks_per_beat
            )));
        }
        Ok(())
    }

    /// Microseconds per quarter note
    pub fn tempo_micros(&self) -> u32 {
        tempo_micros(self.bpm)
    }

    /// Seconds to ticks at this tempo, never negative
    pub fn seconds_to_ticks(&self, seconds: f64) -> u32 {
        let ticks = seconds * (self.ticks_per_beat as f64 * 1_000_000.0 / self.tempo_micros() as f64);
        let ticks = ticks.round_ties_even().max(0.0);
        (ticks as u32).min(U28_MAX)
    }
}

pub fn tempo_micros(bpm: f64) -> u32 {
    ((60_000_000.0 / bpm).round_ties_even() as u32).clamp(1, U24_MAX)
}

/// A channel message at an absolute tick
#[derive(Debug, Clone, Copy)]
struct TimedMessage {
    tick: u32,
    /// 0 for note-off, 1 for note-on: offs sort first at equal ticks
    order: u8,
    channel: u8,
    message: MidiMessage,
}

fn meta(kind: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(kind),
    }
}

fn tempo_track(tempo: u32) -> Track<'static> {
    vec![
        meta(MetaMessage::Tempo(u24::new(tempo.min(U24_MAX)))),
        meta(MetaMessage::EndOfTrack),
    ]
}

/// Turn absolute-tick messages into a delta-timed track
fn messages_to_track(messages: &[TimedMessage]) -> Track<'static> {
    let mut track: Track<'static> = Vec::with_capacity(messages.len() + 1);
    let mut last_tick = 0u32;
    for msg in messages {
        let delta = msg.tick.saturating_sub(last_tick);
        track.push(TrackEvent {
            delta: u28::new(delta.min(U28_MAX)),
            kind: TrackEventKind::Midi {
                channel: u4::new(msg.channel & 0x0F),
                message: msg.message,
            },
        });
        last_tick = last_tick.max(msg.tick);
    }
    track.push(meta(MetaMessage::EndOfTrack));
    track
}

/// Build an in-memory SMF from cloud events
pub fn events_to_smf(events: &[CloudEvent], settings: &ExportSettings) -> XenakisResult<Smf<'static>> {
    settings.validate()?;

    let mut sorted: Vec<&CloudEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.t0.total_cmp(&b.t0));
    let t0_ref = sorted.first().map(|e| e.t0).unwrap_or(0.0);

    let mut messages: Vec<TimedMessage> = Vec::with_capacity(sorted.len() * 2);
    for ev in &sorted {
        let start = (ev.t0 - t0_ref).max(0.0);
        let end = (start + ev.duration_seconds).max(0.0);
        let key = u7::new(midi_note(ev.pitch));
        let channel = ev.channel & 0x0F;

        messages.push(TimedMessage {
            tick: settings.seconds_to_ticks(start),
            order: 1,
            channel,
            message: MidiMessage::NoteOn {
                key,
                vel: u7::new(ev.velocity.min(127)),
            },
        });
        messages.push(TimedMessage {
            tick: settings.seconds_to_ticks(end),
            order: 0,
            channel,
            message: MidiMessage::NoteOff {
                key,
                vel: u7::new(0),
            },
        });
    }
    messages.sort_by_key(|m| (m.tick, m.order));

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(settings.ticks_per_beat)),
    ));
    smf.tracks.push(tempo_track(settings.tempo_micros()));

    if settings.separate_tracks_by_channel {
        let mut by_channel: BTreeMap<u8, Vec<TimedMessage>> = BTreeMap::new();
        for msg in messages {
            by_channel.entry(msg.channel).or_default().push(msg);
        }
        for channel_messages in by_channel.values() {
            smf.tracks.push(messages_to_track(channel_messages));
        }
    } else {
        smf.tracks.push(messages_to_track(&messages));
    }

    Ok(smf)
}

/// Build a single-track SMF playing `pitches` one step apart
pub fn sequence_to_smf(pitches: &[i64], bpm: f64, channel: u8, step_ticks: u32) -> XenakisResult<Smf<'static>> {
    let settings = ExportSettings {
        bpm,
        ..ExportSettings::default()
    };
    settings.validate()?;

    let channel = u4::new(channel & 0x0F);
    let step = u28::new(step_ticks.min(U28_MAX));

    let mut track: Track<'static> = vec![meta(MetaMessage::Tempo(u24::new(settings.tempo_micros())))];
    for &pitch in pitches {
        let key = u7::new(midi_note(pitch));
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(STEP_VELOCITY),
                },
            },
        });
        track.push(TrackEvent {
            delta: step,
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(STEP_RELEASE_VELOCITY),
                },
            },
        });
    }
    track.push(meta(MetaMessage::EndOfTrack));

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(settings.ticks_per_beat)),
    ));
    smf.tracks.push(track);
    Ok(smf)
}

/// Serialize an SMF to bytes
pub fn smf_to_bytes(smf: &Smf<'_>) -> XenakisResult<Vec<u8>> {
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| XenakisError::Serde(format!("MIDI encode failed: {}", e)))?;
    Ok(buf)
}

/// Write an SMF to `path`
pub fn write_smf(smf: &Smf<'_>, path: &Path) -> XenakisResult<()> {
    let buf = smf_to_bytes(smf)?;
    std::fs::write(path, &buf)?;
    info!("Wrote MIDI file {} ({} bytes)", path.display(), buf.len());
    Ok(())
}

/// Export cloud events straight to a file
pub fn export_events(events: &[CloudEvent], settings: &ExportSettings, path: &Path) -> XenakisResult<()> {
    let smf = events_to_smf(events, settings)?;
    write_smf(&smf, path)
}

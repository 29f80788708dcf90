//! Live MIDI output to hardware or software synthesizers

use super::{midi_note, EventSink};
use crate::cloud::CloudEvent;
use crate::error::{XenakisError, XenakisResult};
use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use tracing::{info, warn};

const CLIENT_NAME: &str = "Xenakis MIDI Output";

/// MIDI device info
pub struct MidiDevice {
    pub name: String,
    pub port: MidiOutputPort,
}

/// List available MIDI output devices
pub fn list_devices() -> XenakisResult<Vec<MidiDevice>> {
    let midi_out = MidiOutput::new("Xenakis MIDI Scanner")
        .map_err(|e| XenakisError::Transport(e.to_string()))?;

    let mut devices = Vec::new();
    for port in midi_out.ports() {
        let name = midi_out
            .port_name(&port)
            .map_err(|e| XenakisError::Transport(e.to_string()))?;
        devices.push(MidiDevice { name, port });
    }
    Ok(devices)
}

/// A note-off owed to the device
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingOff {
    at: f64,
    channel: u8,
    note: u8,
}

/// Note-offs waiting for their release time, at most one per (channel, note)
#[derive(Debug, Default)]
struct NoteOffQueue {
    pending: Vec<PendingOff>,
}

impl NoteOffQueue {
    fn len(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return every off due at or before `t`
    fn take_due(&mut self, t: f64) -> Vec<PendingOff> {
        let (due, keep): (Vec<PendingOff>, Vec<PendingOff>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|off| off.at <= t);
        self.pending = keep;
        due
    }

    /// Remove the off still owed to a sounding (channel, note)
    fn take_sounding(&mut self, channel: u8, note: u8) -> Option<PendingOff> {
        let idx = self
            .pending
            .iter()
            .position(|off| off.channel == channel && off.note == note)?;
        Some(self.pending.swap_remove(idx))
    }

    fn push(&mut self, off: PendingOff) {
        self.pending.push(off);
    }
}

/// Sends each event as a note-on and releases it after its duration
///
/// Note-offs are queued against event time and released when a later event
/// arrives at or past their end, or on `finish`. Retriggering a note that is
/// still sounding ends it first, so the new note keeps its full duration.
pub struct MidiDeviceSink {
    connection: MidiOutputConnection,
    pending: NoteOffQueue,
}

impl MidiDeviceSink {
    /// Connect to the first device whose name contains `device_name`, or to
    /// the first available port when `None`
    pub fn connect(device_name: Option<&str>) -> XenakisResult<Self> {
        let devices = list_devices()?;
        let device = match device_name {
            Some(name) => devices.into_iter().find(|d| d.name.contains(name)),
            None => devices.into_iter().next(),
        }
        .ok_or_else(|| {
            XenakisError::Transport(format!(
                "MIDI device '{}' not found",
                device_name.unwrap_or("<any>")
            ))
        })?;

        info!("Connecting to MIDI device: {}", device.name);
        Self::connect_to_port(&device.port)
    }

    pub fn connect_to_port(port: &MidiOutputPort) -> XenakisResult<Self> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| XenakisError::Transport(e.to_string()))?;
        let connection = midi_out
            .connect(port, "xenakis-output")
            .map_err(|e| XenakisError::Transport(e.to_string()))?;
        Ok(Self {
            connection,
            pending: NoteOffQueue::default(),
        })
    }

    pub fn pending_note_offs(&self) -> usize {
        self.pending.len()
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Err(e) = self.connection.send(bytes) {
            warn!("MIDI send failed: {}", e);
        }
    }

    fn release_until(&mut self, t: f64) {
        for off in self.pending.take_due(t) {
            self.send(&note_off_bytes(off.channel, off.note));
        }
    }
}

impl EventSink for MidiDeviceSink {
    fn handle(&mut self, event: &CloudEvent) {
        self.release_until(event.t0);

        let note = midi_note(event.pitch);
        if let Some(off) = self.pending.take_sounding(event.channel, note) {
            self.send(&note_off_bytes(off.channel, off.note));
        }
        self.send(&note_on_bytes(event.channel, note, event.velocity));
        self.pending.push(PendingOff {
            at: event.end_time(),
            channel: event.channel,
            note,
        });
    }

    fn finish(&mut self) -> XenakisResult<()> {
        info!("Releasing {} pending note-offs", self.pending_note_offs());
        self.release_until(f64::INFINITY);
        Ok(())
    }
}

impl Drop for MidiDeviceSink {
    fn drop(&mut self) {
        self.release_until(f64::INFINITY);
    }
}

fn note_on_bytes(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

fn note_off_bytes(channel: u8, note: u8) -> [u8; 3] {
    [0x80 | (channel & 0x0F), note & 0x7F, 0]
}

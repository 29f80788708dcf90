//! Event sinks
//!
//! A sink consumes the events a cloud produces. `handle` never fails from
//! the caller's point of view: transports log delivery problems and carry on,
//! so a live run is only ever stopped by its own `t_end` / `max_events`.
//! `finish` flushes whatever a sink still holds (pending note-offs, buffered
//! writers).

mod console;
mod midi_device;
mod osc;

pub use console::{JsonLinesSink, PrintSink};
pub use midi_device::{list_devices, MidiDevice, MidiDeviceSink};
pub use osc::{OscSink, DEFAULT_ADDRESS as DEFAULT_OSC_ADDRESS};

use crate::cloud::CloudEvent;
use crate::error::XenakisResult;

/// Consumer of cloud events
pub trait EventSink {
    fn handle(&mut self, event: &CloudEvent);

    fn finish(&mut self) -> XenakisResult<()> {
        Ok(())
    }
}

impl<F> EventSink for F
where
    F: FnMut(&CloudEvent),
{
    fn handle(&mut self, event: &CloudEvent) {
        self(event)
    }
}

/// Buffers every event for offline export
#[derive(Debug, Default, Clone)]
pub struct CollectSink {
    events: Vec<CloudEvent>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[CloudEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<CloudEvent> {
        self.events
    }
}

impl EventSink for CollectSink {
    fn handle(&mut self, event: &CloudEvent) {
        self.events.push(event.clone());
    }
}

/// Clamp an event pitch into the 7-bit MIDI note range
pub(crate) fn midi_note(pitch: i64) -> u8 {
    pitch.clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn event(t0: f64, pitch: i64) -> CloudEvent {
        CloudEvent {
            t0,
            pitch,
            duration_seconds: 0.5,
            velocity: 80,
            channel: 0,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |ev: &CloudEvent| seen.push(ev.pitch);
            sink.handle(&event(0.0, 60));
            sink.handle(&event(1.0, 62));
            assert!(sink.finish().is_ok());
        }
        assert_eq!(seen, vec![60, 62]);
    }

    #[test]
    fn test_collect_sink_keeps_order() {
        let mut sink = CollectSink::new();
        sink.handle(&event(0.0, 60));
        sink.handle(&event(0.5, 64));
        let events = sink.into_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].pitch, 64);
    }

    #[test]
    fn test_midi_note_clamps() {
        assert_eq!(midi_note(-3), 0);
        assert_eq!(midi_note(60), 60);
        assert_eq!(midi_note(200), 127);
    }
}

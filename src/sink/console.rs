//! Text sinks: human-readable lines and JSON lines

use super::EventSink;
use crate::cloud::CloudEvent;
use crate::error::XenakisResult;
use std::io::{self, Stdout, Write};
use tracing::warn;

/// Prints one line per event
pub struct PrintSink<W: Write = Stdout> {
    out: W,
}

impl PrintSink<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `[t0] ch=CC pitch=PPP vel=VVV dur=D.DDDs`
pub fn format_event(ev: &CloudEvent) -> String {
    format!(
        "[{:.3}] ch={:02} pitch={:03} vel={:03} dur={:.3}s",
        ev.t0, ev.channel, ev.pitch, ev.velocity, ev.duration_seconds
    )
}

impl<W: Write> EventSink for PrintSink<W> {
    fn handle(&mut self, event: &CloudEvent) {
        if let Err(e) = writeln!(self.out, "{}", format_event(event)) {
            warn!("print sink write failed: {}", e);
        }
    }

    fn finish(&mut self) -> XenakisResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Writes each event as a single-line JSON object
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn handle(&mut self, event: &CloudEvent) {
        let result = serde_json::to_writer(&mut self.out, event)
            .map_err(io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"));
        if let Err(e) = result {
            warn!("json sink write failed: {}", e);
        }
    }

    fn finish(&mut self) -> XenakisResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

//! OSC output over UDP

use super::EventSink;
use crate::cloud::CloudEvent;
use crate::error::{XenakisError, XenakisResult};
use rosc::{OscMessage, OscPacket, OscType};
use std::net::{SocketAddr, UdpSocket};
use tracing::warn;

pub const DEFAULT_ADDRESS: &str = "/note";

/// Sends `address pitch velocity duration channel` per event
pub struct OscSink {
    socket: UdpSocket,
    target: SocketAddr,
    address: String,
}

impl OscSink {
    pub fn new(target: &str, address: &str) -> XenakisResult<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let target = target
            .parse::<SocketAddr>()
            .map_err(|e| XenakisError::Transport(format!("bad OSC target '{}': {}", target, e)))?;

        Ok(Self {
            socket,
            target,
            address: address.to_string(),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn send(&self, packet: &OscPacket) -> XenakisResult<()> {
        let buf =
            rosc::encoder::encode(packet).map_err(|e| XenakisError::Transport(e.to_string()))?;
        self.socket.send_to(&buf, self.target)?;
        Ok(())
    }
}

/// OSC packet for one event
pub fn event_packet(address: &str, event: &CloudEvent) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args: vec![
            OscType::Int(event.pitch as i32),
            OscType::Int(event.velocity as i32),
            OscType::Float(event.duration_seconds as f32),
            OscType::Int(event.channel as i32),
        ],
    })
}

impl EventSink for OscSink {
    fn handle(&mut self, event: &CloudEvent) {
        if let Err(e) = self.send(&event_packet(&self.address, event)) {
            warn!("OSC send to {} failed: {}", self.target, e);
        }
    }
}

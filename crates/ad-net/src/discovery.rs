//! Discovery beacon
//!
//! Sensors sit on the LAN without a configured server address. They listen
//! for this broadcast and send hits back to whoever emitted it. Losing a
//! beacon is harmless: the next one follows a period later.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use crate::{NetConfig, NetError, NetResult};

pub struct DiscoveryBeacon {
    socket: UdpSocket,
    target: SocketAddr,
    payload: Vec<u8>,
    period: Duration,
    last_sent: Option<Instant>,
}

impl DiscoveryBeacon {
    pub fn new(config: &NetConfig) -> NetResult<Self> {
        let target = config.beacon_target()?;
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|source| NetError::Bind {
            addr: "0.0.0.0:0".into(),
            source,
        })?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            socket,
            target,
            payload: config.beacon_payload.as_bytes().to_vec(),
            period: config.broadcast_period(),
            last_sent: None,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send the beacon if a full period has passed (always on the first call).
    ///
    /// Returns whether a send was attempted. Send failures are logged only.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = match self.last_sent {
            Some(last) => now.saturating_duration_since(last) >= self.period,
            None => true,
        };
        if !due {
            return false;
        }

        if let Err(e) = self.socket.send_to(&self.payload, self.target) {
            log::debug!("[Discovery] Beacon to {} failed: {}", self.target, e);
        }
        self.last_sent = Some(now);
        true
    }
}

//! Hit listener
//!
//! One cooperative loop owns both UDP sockets. Each pass:
//!
//! 1. emits the discovery beacon when due,
//! 2. drains every pending hit datagram without blocking,
//! 3. classifies, debounces and dispatches each one inline,
//! 4. sleeps briefly when the socket ran dry.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ad_core::HitSource;

use crate::{classify, Debouncer, DiscoveryBeacon, NetConfig, NetError, NetResult, HIT_DATAGRAM_MAX};

/// Receiver of accepted hits. Called inline on the listener thread.
pub trait HitSink: Send + Sync {
    fn on_hit(&self, source: HitSource);
}

impl<F> HitSink for F
where
    F: Fn(HitSource) + Send + Sync,
{
    fn on_hit(&self, source: HitSource) {
        self(source)
    }
}

/// Counters for one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub received: usize,
    pub dispatched: usize,
    pub debounced: usize,
    pub dropped: usize,
}

pub struct HitListener {
    socket: UdpSocket,
    beacon: DiscoveryBeacon,
    debouncer: Debouncer,
    sink: Arc<dyn HitSink>,
    idle_sleep: Duration,
}

impl HitListener {
    pub fn bind(config: &NetConfig, sink: Arc<dyn HitSink>) -> NetResult<Self> {
        config.validate()?;
        let addr = config.hit_addr()?;
        let socket = UdpSocket::bind(addr).map_err(|source| NetError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_nonblocking(true)?;

        let beacon = DiscoveryBeacon::new(config)?;
        let debouncer = Debouncer::new(config.debounce.enabled, config.debounce.window());

        log::info!(
            "[HitListener] Listening on {} (beacon -> {}, debounce {})",
            socket.local_addr()?,
            beacon.target(),
            if debouncer.is_enabled() {
                format!("{} ms", config.debounce.window_ms)
            } else {
                "off".to_string()
            }
        );

        Ok(Self {
            socket,
            beacon,
            debouncer,
            sink,
            idle_sleep: config.idle_sleep(),
        })
    }

    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// One beacon check plus one full drain of the hit socket
    pub fn poll_once(&mut self) -> PollStats {
        self.beacon.tick(Instant::now());

        let mut stats = PollStats::default();
        let mut buf = [0u8; HIT_DATAGRAM_MAX];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, _from)) => {
                    stats.received += 1;
                    let Some(source) = classify(&buf[..len]) else {
                        stats.dropped += 1;
                        continue;
                    };
                    if self.debouncer.accept(source, Instant::now()) {
                        self.sink.on_hit(source);
                        stats.dispatched += 1;
                    } else {
                        stats.debounced += 1;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("[HitListener] UDP receive error: {}", e);
                    break;
                }
            }
        }
        stats
    }

    /// Poll until `stop` is raised
    pub fn run(mut self, stop: Arc<AtomicBool>) {
        while !stop.load(Ordering::Acquire) {
            let stats = self.poll_once();
            if stats.received == 0 {
                thread::sleep(self.idle_sleep);
            }
        }
        log::info!("[HitListener] Stopped");
    }

    pub fn spawn(self, stop: Arc<AtomicBool>) -> NetResult<JoinHandle<()>> {
        thread::Builder::new()
            .name("hit-listener".into())
            .spawn(move || self.run(stop))
            .map_err(NetError::Socket)
    }
}

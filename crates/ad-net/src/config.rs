//! Network configuration

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{NetError, NetResult};

/// Debounce settings for hit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub enabled: bool,
    pub window_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 40,
        }
    }
}

impl DebounceConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// UDP discovery and hit protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Local address the hit socket binds to
    pub bind_address: String,
    pub hit_port: u16,
    pub discovery_port: u16,
    pub broadcast_address: String,
    pub broadcast_period_ms: u64,
    pub beacon_payload: String,
    /// Sleep between polls when nothing is pending
    pub idle_sleep_us: u64,
    pub debounce: DebounceConfig,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            hit_port: 5556,
            discovery_port: 5555,
            broadcast_address: "255.255.255.255".into(),
            broadcast_period_ms: 1000,
            beacon_payload: "AIRDRUM_SERVER".into(),
            idle_sleep_us: 1000,
            debounce: DebounceConfig::default(),
        }
    }
}

impl NetConfig {
    pub fn validate(&self) -> NetResult<()> {
        self.hit_addr()?;
        self.beacon_target()?;
        if self.broadcast_period_ms == 0 {
            return Err(NetError::InvalidConfig(
                "net.broadcast_period_ms must be non-zero".into(),
            ));
        }
        if self.beacon_payload.is_empty() {
            return Err(NetError::InvalidConfig("net.beacon_payload must not be empty".into()));
        }
        Ok(())
    }

    pub fn hit_addr(&self) -> NetResult<SocketAddr> {
        parse_ip(&self.bind_address).map(|ip| SocketAddr::new(ip, self.hit_port))
    }

    pub fn beacon_target(&self) -> NetResult<SocketAddr> {
        parse_ip(&self.broadcast_address).map(|ip| SocketAddr::new(ip, self.discovery_port))
    }

    pub fn broadcast_period(&self) -> Duration {
        Duration::from_millis(self.broadcast_period_ms)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_micros(self.idle_sleep_us)
    }
}

/// WebSocket frame ingress settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

impl IngressConfig {
    pub fn addr(&self) -> NetResult<SocketAddr> {
        parse_ip(&self.bind_address).map(|ip| SocketAddr::new(ip, self.port))
    }
}

fn parse_ip(text: &str) -> NetResult<IpAddr> {
    text.parse()
        .map_err(|_| NetError::InvalidAddress(text.to_string()))
}

//! Discovery socket configuration

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default UPnP-style discovery port
pub const DISCOVERY_PORT: u16 = 1901;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Multicast group probed when looking a device up by UUID
    #[serde(default = "default_group")]
    pub group: Ipv4Addr,
    /// Port devices listen on for probes
    #[serde(default = "default_port")]
    pub port: u16,
    /// Local address to bind
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    /// Local port to bind; 0 picks an ephemeral port and only hears replies
    /// to our own probes, anything else also joins the multicast group
    #[serde(default)]
    pub listen_port: u16,
    /// Probe re-send interval while waiting for an answer
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,
    /// Receive buffer size in bytes
    #[serde(default = "default_recv_buffer")]
    pub recv_buffer: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            group: default_group(),
            port: default_port(),
            bind: default_bind(),
            listen_port: 0,
            probe_interval_ms: default_probe_interval(),
            recv_buffer: default_recv_buffer(),
        }
    }
}

impl DiscoveryConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(1))
    }
}

fn default_group() -> Ipv4Addr {
    Ipv4Addr::new(239, 255, 255, 250)
}

fn default_port() -> u16 {
    DISCOVERY_PORT
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_probe_interval() -> u64 {
    1000
}

fn default_recv_buffer() -> usize {
    4096
}

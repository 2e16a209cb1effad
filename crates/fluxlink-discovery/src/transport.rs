//! Announcement sources: where discovery reads device announcements from

use fluxlink_core::LookupMode;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::announce::{decode_announcement, encode_probe, Announcement};
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;

/// Something that can solicit and deliver device announcements
///
/// `recv` must be cancel safe: discovery races it against its deadline and
/// probe timer.
pub trait AnnouncementSource: Send {
    /// Ask devices matching `lookup` to announce themselves
    fn probe(
        &mut self,
        lookup: LookupMode,
    ) -> impl Future<Output = Result<(), DiscoveryError>> + Send;

    /// Wait for the next well-formed announcement
    fn recv(&mut self) -> impl Future<Output = Result<Announcement, DiscoveryError>> + Send;
}

/// UDP announcement source
///
/// The socket lives exactly as long as this value; dropping it stops
/// listening.
pub struct UdpAnnouncementSource {
    socket: UdpSocket,
    group: SocketAddr,
    port: u16,
    buf: Vec<u8>,
}

impl UdpAnnouncementSource {
    pub async fn bind(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let addr = SocketAddr::new(config.bind, config.listen_port);
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| DiscoveryError::Bind { addr, source })?;

        if config.listen_port != 0 {
            let interface = match config.bind {
                IpAddr::V4(v4) => v4,
                IpAddr::V6(_) => std::net::Ipv4Addr::UNSPECIFIED,
            };
            match socket.join_multicast_v4(config.group, interface) {
                Ok(()) => debug!(
                    group = %config.group,
                    port = config.listen_port,
                    "Joined discovery multicast group"
                ),
                Err(e) => warn!(
                    group = %config.group,
                    interface = %interface,
                    error = %e,
                    "Could not join discovery multicast group, listening for direct replies only"
                ),
            }
        }

        Ok(Self {
            socket,
            group: SocketAddr::new(IpAddr::V4(config.group), config.port),
            port: config.port,
            buf: vec![0u8; config.recv_buffer.max(512)],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DiscoveryError> {
        Ok(self.socket.local_addr()?)
    }

    fn probe_target(&self, lookup: &LookupMode) -> SocketAddr {
        match lookup {
            LookupMode::Uuid(_) => self.group,
            LookupMode::Address(ip) => SocketAddr::new(*ip, self.port),
        }
    }
}

impl AnnouncementSource for UdpAnnouncementSource {
    async fn probe(&mut self, lookup: LookupMode) -> Result<(), DiscoveryError> {
        let packet = encode_probe(&lookup)?;
        let target = self.probe_target(&lookup);
        trace!(target = %target, len = packet.len(), "Sending discovery probe");
        self.socket.send_to(&packet, target).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Announcement, DiscoveryError> {
        loop {
            let (len, source) = self.socket.recv_from(&mut self.buf).await?;
            trace!(source = %source, len = len, "Received discovery datagram");

            match decode_announcement(&self.buf[..len], source) {
                Ok(announcement) => return Ok(announcement),
                Err(e) => debug!(source = %source, error = %e, "Ignoring malformed announcement"),
            }
        }
    }
}

/// In-process announcement source fed through a channel
///
/// Useful when announcements already arrive through another listener, and
/// in tests.
pub struct ChannelSource {
    rx: mpsc::Receiver<Announcement>,
    probes: Vec<LookupMode>,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<Announcement>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            tx,
            Self {
                rx,
                probes: Vec::new(),
            },
        )
    }

    /// Probes requested so far, oldest first
    pub fn probes(&self) -> &[LookupMode] {
        &self.probes
    }
}

impl AnnouncementSource for ChannelSource {
    async fn probe(&mut self, lookup: LookupMode) -> Result<(), DiscoveryError> {
        self.probes.push(lookup);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Announcement, DiscoveryError> {
        self.rx.recv().await.ok_or(DiscoveryError::SourceClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn loopback_config() -> DiscoveryConfig {
        DiscoveryConfig {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_udp_source_skips_malformed_datagrams() {
        let mut source = UdpAnnouncementSource::bind(&loopback_config()).await.unwrap();
        let target = source.local_addr().unwrap();

        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        device.send_to(b"not json", target).await.unwrap();
        device
            .send_to(
                br#"{"uuid":"0c54b4d7-5a3e-4b8e-9f0a-2a0c9a1d0b31","name":"Delta","serial":"A1","model_id":"delta-1","version":"1.6"}"#,
                target,
            )
            .await
            .unwrap();

        let announcement = tokio::time::timeout(Duration::from_secs(5), source.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(announcement.metadata.name, "Delta");
        assert_eq!(announcement.metadata.ipaddr, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_udp_probe_by_address_goes_to_device() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = DiscoveryConfig {
            port: device.local_addr().unwrap().port(),
            ..loopback_config()
        };
        let mut source = UdpAnnouncementSource::bind(&config).await.unwrap();

        source
            .probe(LookupMode::Address(IpAddr::V4(Ipv4Addr::LOCALHOST)))
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (len, from) = tokio::time::timeout(Duration::from_secs(5), device.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(from, source.local_addr().unwrap());
        let probe: crate::Probe = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(probe.op, "discover");
    }

    #[tokio::test]
    async fn test_channel_source_reports_closed() {
        let (tx, mut source) = ChannelSource::new(1);
        drop(tx);
        assert!(matches!(source.recv().await, Err(DiscoveryError::SourceClosed)));
    }
}

//! fluxlink Discovery - Resolve a partial device identity on the network
//!
//! Devices answer discovery probes with an announcement datagram. This crate
//! provides:
//! - The announcement/probe codec
//! - A UDP multicast announcement source
//! - The bounded, one-shot discovery client used during connection setup

pub mod announce;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use announce::{decode_announcement, encode_probe, Announcement, Probe};
pub use client::{
    progress_fn, Discover, DiscoveryClient, DiscoveryObserver, NoopObserver, ProgressFn,
    UdpDiscovery,
};
pub use config::DiscoveryConfig;
pub use error::DiscoveryError;
pub use transport::{AnnouncementSource, ChannelSource, UdpAnnouncementSource};

//! Discovery error types

use fluxlink_core::LookupMode;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Device not found: no announcement for {lookup} before the lookup timeout")]
    DeviceNotFound { lookup: LookupMode },
    #[error("Device identity has neither a UUID nor an IP address")]
    Unidentifiable,
    #[error("Failed to bind discovery socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Announcement source closed")]
    SourceClosed,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DiscoveryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscoveryError::DeviceNotFound { .. })
    }
}

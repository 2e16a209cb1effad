//! Announcement and probe datagrams
//!
//! Every datagram carries a single JSON object. A probe asks devices to
//! announce themselves:
//!
//! ```json
//! {"op": "discover", "uuid": "0c54b4d7-5a3e-4b8e-9f0a-2a0c9a1d0b31"}
//! ```
//!
//! and an announcement carries the device metadata. `ipaddr` may be omitted,
//! in which case the datagram's source address is used. Keys other than the
//! well-known profile fields are kept as backend-specific metadata.

use fluxlink_core::{DeviceMetadata, LookupMode, Meta};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use uuid::Uuid;

use crate::error::DiscoveryError;

/// A decoded device announcement
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub metadata: DeviceMetadata,
    /// Where the datagram came from
    pub source: SocketAddr,
}

impl Announcement {
    /// Whether this announcement answers the given lookup
    pub fn matches(&self, lookup: &LookupMode) -> bool {
        match lookup {
            LookupMode::Uuid(uuid) => self.metadata.uuid == *uuid,
            LookupMode::Address(ip) => self.metadata.ipaddr == *ip || self.source.ip() == *ip,
        }
    }
}

#[derive(Deserialize)]
struct AnnouncementWire {
    uuid: Uuid,
    name: String,
    serial: String,
    model_id: String,
    version: String,
    #[serde(default)]
    ipaddr: Option<IpAddr>,
    #[serde(flatten)]
    meta: Meta,
}

/// Decode an announcement datagram received from `source`
pub fn decode_announcement(
    data: &[u8],
    source: SocketAddr,
) -> Result<Announcement, DiscoveryError> {
    let wire: AnnouncementWire = serde_json::from_slice(data)?;

    Ok(Announcement {
        metadata: DeviceMetadata {
            uuid: wire.uuid,
            name: wire.name,
            serial: wire.serial,
            model_id: wire.model_id,
            version: wire.version,
            ipaddr: wire.ipaddr.unwrap_or_else(|| source.ip()),
            meta: wire.meta,
        },
        source,
    })
}

/// Discovery request datagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub op: String,
    /// Only the device with this UUID should answer; `None` asks everyone
    pub uuid: Option<Uuid>,
}

/// Encode the probe for a lookup
pub fn encode_probe(lookup: &LookupMode) -> Result<Vec<u8>, DiscoveryError> {
    let probe = Probe {
        op: "discover".to_string(),
        uuid: match lookup {
            LookupMode::Uuid(uuid) => Some(*uuid),
            LookupMode::Address(_) => None,
        },
    };
    Ok(serde_json::to_vec(&probe)?)
}

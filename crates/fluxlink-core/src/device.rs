//! Device identity, announced metadata, and resolved profiles

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

use crate::version::{StrictVersion, VersionError};

/// Auxiliary key/value pairs whose meaning is backend specific
pub type Meta = BTreeMap<String, serde_json::Value>;

/// How a device is looked up on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Match announcements carrying this UUID
    Uuid(Uuid),
    /// Match announcements coming from this address
    Address(IpAddr),
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupMode::Uuid(uuid) => write!(f, "uuid {}", uuid),
            LookupMode::Address(ip) => write!(f, "address {}", ip),
        }
    }
}

/// What the caller knows about a device before connecting
///
/// A nil UUID means "unknown, resolve by IP address".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub uuid: Uuid,
    pub ipaddr: Option<IpAddr>,
}

impl DeviceIdentity {
    pub fn new(uuid: Uuid, ipaddr: Option<IpAddr>) -> Self {
        Self { uuid, ipaddr }
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self { uuid, ipaddr: None }
    }

    pub fn from_ipaddr(ipaddr: IpAddr) -> Self {
        Self {
            uuid: Uuid::nil(),
            ipaddr: Some(ipaddr),
        }
    }

    /// Discovery mode for this identity. A known UUID always wins over an
    /// address; `None` when neither is usable.
    pub fn lookup_mode(&self) -> Option<LookupMode> {
        if !self.uuid.is_nil() {
            Some(LookupMode::Uuid(self.uuid))
        } else {
            self.ipaddr.map(LookupMode::Address)
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lookup_mode() {
            Some(mode) => write!(f, "{}", mode),
            None => write!(f, "<unknown device>"),
        }
    }
}

/// Unparsed profile fields, as supplied by a caller or announced by a device
///
/// Any key besides the well-known ones ends up in `meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub uuid: Uuid,
    pub name: String,
    pub serial: String,
    pub model_id: String,
    pub version: String,
    pub ipaddr: IpAddr,
    #[serde(flatten)]
    pub meta: Meta,
}

impl DeviceMetadata {
    pub fn parse_version(&self) -> Result<StrictVersion, VersionError> {
        StrictVersion::parse(&self.version)
    }
}

/// The canonical, resolved view of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub uuid: Uuid,
    pub name: String,
    pub serial: String,
    pub model_id: String,
    pub version: StrictVersion,
    pub ipaddr: IpAddr,
    #[serde(default)]
    pub meta: Meta,
}

impl DeviceProfile {
    /// Build a profile from metadata, keeping `uuid` when it is already known
    ///
    /// The first non-nil UUID is the durable identity of the device: once
    /// `uuid` is set it is never replaced by the metadata's UUID. Every other
    /// field comes from `metadata`.
    pub fn merge(uuid: Uuid, metadata: DeviceMetadata) -> Result<Self, VersionError> {
        let version = metadata.parse_version()?;
        let uuid = if uuid.is_nil() { metadata.uuid } else { uuid };

        Ok(Self {
            uuid,
            name: metadata.name,
            serial: metadata.serial,
            model_id: metadata.model_id,
            version,
            ipaddr: metadata.ipaddr,
            meta: metadata.meta,
        })
    }
}

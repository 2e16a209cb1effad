//! fluxlink Core - Shared types for the fluxlink device broker
//!
//! This crate provides the foundational types used by every other crate:
//! - Strict firmware version parsing and ordering
//! - Device identity, announced metadata, and resolved profiles
//! - Client credential material
//! - Network settings and wifi scan results exchanged with backends

pub mod credentials;
pub mod device;
pub mod network;
pub mod version;

pub use credentials::{ClientKey, KeyError};
pub use device::{DeviceIdentity, DeviceMetadata, DeviceProfile, LookupMode, Meta};
pub use network::{NetworkMethod, NetworkSettings, WifiMode, WifiNetwork, WifiSecurity};
pub use version::{PreRelease, StrictVersion, VersionError};

//! Backend interfaces, one implementation per protocol generation
//!
//! A backend is registered as a [`BackendCandidate`]: a capability predicate
//! over (model, firmware version) plus a constructor. The constructed
//! [`UpnpBackend`] is owned by exactly one task.

use async_trait::async_trait;
use fluxlink_core::{ClientKey, DeviceProfile, Meta, NetworkSettings, StrictVersion, WifiNetwork};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::BackendError;

/// Opaque backend configuration, forwarded verbatim to the chosen backend
///
/// Each task owns its own copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendOptions(Meta);

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Meta> for BackendOptions {
    fn from(meta: Meta) -> Self {
        Self(meta)
    }
}

/// Everything a backend is constructed with
#[derive(Debug, Clone)]
pub struct BackendContext {
    pub client_key: ClientKey,
    pub uuid: Uuid,
    pub version: StrictVersion,
    pub model_id: String,
    pub ipaddr: IpAddr,
    pub meta: Meta,
    pub options: BackendOptions,
}

impl BackendContext {
    pub fn new(client_key: ClientKey, profile: &DeviceProfile, options: BackendOptions) -> Self {
        Self {
            client_key,
            uuid: profile.uuid,
            version: profile.version,
            model_id: profile.model_id.clone(),
            ipaddr: profile.ipaddr,
            meta: profile.meta.clone(),
            options,
        }
    }
}

/// Capability predicate over a device's model and firmware
pub trait DeviceSupport: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    fn supports(&self, model_id: &str, version: &StrictVersion) -> bool;
}

impl<T: DeviceSupport + ?Sized> DeviceSupport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports(&self, model_id: &str, version: &StrictVersion) -> bool {
        (**self).supports(model_id, version)
    }
}

impl<T: DeviceSupport + ?Sized> DeviceSupport for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports(&self, model_id: &str, version: &StrictVersion) -> bool {
        (**self).supports(model_id, version)
    }
}

/// A registrable backend implementation
#[async_trait]
pub trait BackendCandidate: DeviceSupport {
    /// Open a session with the device
    async fn connect(&self, ctx: BackendContext) -> Result<Box<dyn UpnpBackend>, BackendError>;
}

/// Device configuration operations offered by every backend
///
/// Implementations need not support concurrent callers; the task hands out
/// `&mut` access only.
#[async_trait]
pub trait UpnpBackend: Send {
    /// Add the client key to the device's trust list
    async fn add_trust(&mut self) -> Result<(), BackendError>;

    async fn rename(&mut self, new_name: &str) -> Result<(), BackendError>;

    /// Change the device password; with `reset_acl` every other authorized
    /// client loses access
    async fn modify_password(
        &mut self,
        old_password: &str,
        new_password: &str,
        reset_acl: bool,
    ) -> Result<(), BackendError>;

    async fn modify_network(&mut self, settings: &NetworkSettings) -> Result<(), BackendError>;

    /// Access points currently visible to the device
    async fn get_wifi_list(&mut self) -> Result<Vec<WifiNetwork>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_options_are_owned_per_value() {
        let base = BackendOptions::new().with("timeout", 5);
        let mut copy = base.clone();
        copy = copy.with("timeout", 10);
        assert_eq!(base.get("timeout"), Some(&serde_json::json!(5)));
        assert_eq!(copy.get("timeout"), Some(&serde_json::json!(10)));
    }

    #[test]
    fn test_options_serialize_as_map() {
        let options = BackendOptions::new().with("skip_ping", true);
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            serde_json::json!({"skip_ping": true})
        );
    }

    #[test]
    fn test_context_from_profile() {
        let key = ClientKey::from_pem("-----BEGIN KEY-----\nAAAA\n-----END KEY-----").unwrap();
        let mut meta = Meta::new();
        meta.insert("has_password".to_string(), serde_json::Value::Bool(true));
        let profile = DeviceProfile {
            uuid: Uuid::new_v4(),
            name: "Delta".to_string(),
            serial: "A1".to_string(),
            model_id: "delta-1p".to_string(),
            version: StrictVersion::new(1, 6, 0),
            ipaddr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3)),
            meta,
        };

        let ctx = BackendContext::new(key.clone(), &profile, BackendOptions::new());
        assert_eq!(ctx.uuid, profile.uuid);
        assert_eq!(ctx.model_id, "delta-1p");
        assert_eq!(ctx.version, profile.version);
        assert_eq!(ctx.meta, profile.meta);
        assert_eq!(ctx.client_key, key);
    }
}

//! Profile resolution: supplied metadata or discovery, merged into a profile

use fluxlink_core::{DeviceIdentity, DeviceMetadata, DeviceProfile};
use fluxlink_discovery::{Discover, DiscoveryObserver};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::TaskError;

/// Tracks the durable UUID of one device across merges
///
/// Every profile a task ends up with passes through [`ProfileResolver::merge`].
/// The first non-nil UUID seen is kept for good, even when a later source
/// reports a different one.
#[derive(Debug, Clone)]
pub struct ProfileResolver {
    uuid: Uuid,
}

impl ProfileResolver {
    pub fn new(identity: &DeviceIdentity) -> Self {
        Self {
            uuid: identity.uuid,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Merge metadata into a profile. A malformed version leaves the
    /// resolver untouched.
    pub fn merge(&mut self, metadata: DeviceMetadata) -> Result<DeviceProfile, TaskError> {
        let announced = metadata.uuid;
        let profile = DeviceProfile::merge(self.uuid, metadata)?;

        if profile.uuid != announced {
            warn!(
                kept = %profile.uuid,
                announced = %announced,
                "Device reported a different UUID; keeping the known one"
            );
        }

        self.uuid = profile.uuid;
        Ok(profile)
    }

    /// Produce a profile for `identity`
    ///
    /// Supplied metadata is merged without touching the network. Otherwise
    /// `discovery` is asked to find the device within `timeout`.
    pub async fn resolve<D: Discover>(
        &mut self,
        identity: &DeviceIdentity,
        supplied: Option<DeviceMetadata>,
        discovery: &mut D,
        observer: &mut dyn DiscoveryObserver,
        timeout: Option<Duration>,
    ) -> Result<DeviceProfile, TaskError> {
        if let Some(metadata) = supplied {
            debug!(uuid = %metadata.uuid, "Using supplied device metadata");
            return self.merge(metadata);
        }

        let metadata = discovery.discover(identity, observer, timeout).await?;
        self.merge(metadata)
    }
}

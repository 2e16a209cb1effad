//! The device task: one resolved device, one backend

use fluxlink_core::{
    ClientKey, DeviceIdentity, DeviceMetadata, DeviceProfile, NetworkSettings, WifiNetwork,
};
use fluxlink_discovery::{Discover, DiscoveryObserver, NoopObserver};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::{BackendContext, BackendOptions, UpnpBackend};
use crate::error::{BackendError, TaskError};
use crate::registry::BackendRegistry;
use crate::resolver::ProfileResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Resolving,
    BackendReady,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Resolving => "resolving",
            Phase::BackendReady => "backend_ready",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct Lifecycle {
    phase: Phase,
    identity: DeviceIdentity,
}

impl Lifecycle {
    fn advance(&mut self, next: Phase) {
        info!(device = %self.identity, from = %self.phase, to = %next, "Task state changed");
        self.phase = next;
    }

    fn fail(&mut self, err: TaskError) -> TaskError {
        warn!(device = %self.identity, phase = %self.phase, error = %err, "Task setup failed");
        self.phase = Phase::Failed;
        err
    }
}

/// Parameters for bringing up an [`UpnpTask`]
pub struct UpnpTaskBuilder {
    identity: DeviceIdentity,
    client_key: ClientKey,
    device_metadata: Option<DeviceMetadata>,
    remote_profile: Option<DeviceMetadata>,
    backend_options: BackendOptions,
    observer: Box<dyn DiscoveryObserver>,
    lookup_timeout: Option<Duration>,
}

impl UpnpTaskBuilder {
    /// Metadata the caller already knows; discovery is skipped
    pub fn device_metadata(mut self, metadata: DeviceMetadata) -> Self {
        self.device_metadata = Some(metadata);
        self
    }

    /// A previously cached profile, used when no explicit metadata is given
    pub fn remote_profile(mut self, profile: DeviceMetadata) -> Self {
        self.remote_profile = Some(profile);
        self
    }

    pub fn backend_options(mut self, options: BackendOptions) -> Self {
        self.backend_options = options;
        self
    }

    /// Receives feedback while the device is being looked up
    pub fn observer(mut self, observer: impl DiscoveryObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Give up discovery after `timeout`. Unbounded by default.
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    /// Resolve the profile, select a backend, and connect it
    ///
    /// Suspends while discovery runs, for at most the lookup timeout, and
    /// while the backend opens its session.
    pub async fn connect<D: Discover>(
        self,
        registry: &BackendRegistry,
        discovery: &mut D,
    ) -> Result<UpnpTask, TaskError> {
        let UpnpTaskBuilder {
            identity,
            client_key,
            device_metadata,
            remote_profile,
            backend_options,
            mut observer,
            lookup_timeout,
        } = self;

        let mut lifecycle = Lifecycle {
            phase: Phase::Uninitialized,
            identity,
        };
        lifecycle.advance(Phase::Resolving);

        let mut resolver = ProfileResolver::new(&identity);
        let supplied = device_metadata.or(remote_profile);
        let profile = resolver
            .resolve(&identity, supplied, discovery, observer.as_mut(), lookup_timeout)
            .await
            .map_err(|e| lifecycle.fail(e))?;

        let candidate = registry
            .select(&profile.model_id, &profile.version)
            .map_err(|e| lifecycle.fail(e))?;
        let backend_name = candidate.name().to_string();

        info!(
            uuid = %profile.uuid,
            backend = %backend_name,
            key = %client_key.fingerprint(),
            "Connecting backend"
        );
        let ctx = BackendContext::new(client_key, &profile, backend_options);
        let backend = candidate
            .connect(ctx)
            .await
            .map_err(|e| lifecycle.fail(e.into()))?;

        lifecycle.advance(Phase::BackendReady);

        Ok(UpnpTask {
            profile,
            backend,
            backend_name,
        })
    }
}

/// A connected device
///
/// Exists only once a backend has been selected and connected. Every
/// operation is forwarded to that backend; backend errors come back
/// unchanged. Operations take `&mut self`, so callers sharing a task across
/// threads must serialize access themselves (e.g. behind a mutex).
pub struct UpnpTask {
    profile: DeviceProfile,
    backend: Box<dyn UpnpBackend>,
    backend_name: String,
}

impl UpnpTask {
    pub fn builder(identity: DeviceIdentity, client_key: ClientKey) -> UpnpTaskBuilder {
        UpnpTaskBuilder {
            identity,
            client_key,
            device_metadata: None,
            remote_profile: None,
            backend_options: BackendOptions::default(),
            observer: Box::new(NoopObserver),
            lookup_timeout: None,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.profile.uuid
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Name of the backend driving this device
    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Add the client key to the device trust list
    pub async fn add_trust(&mut self) -> Result<(), BackendError> {
        self.backend.add_trust().await
    }

    pub async fn rename(&mut self, new_name: &str) -> Result<(), BackendError> {
        self.backend.rename(new_name).await
    }

    /// Change the device password. With `reset_acl` every other authorized
    /// client is removed from the device.
    pub async fn modify_password(
        &mut self,
        old_password: &str,
        new_password: &str,
        reset_acl: bool,
    ) -> Result<(), BackendError> {
        self.backend
            .modify_password(old_password, new_password, reset_acl)
            .await
    }

    pub async fn modify_network(&mut self, settings: &NetworkSettings) -> Result<(), BackendError> {
        self.backend.modify_network(settings).await
    }

    pub async fn get_wifi_list(&mut self) -> Result<Vec<WifiNetwork>, BackendError> {
        self.backend.get_wifi_list().await
    }
}

impl fmt::Debug for UpnpTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpnpTask")
            .field("profile", &self.profile)
            .field("backend", &self.backend_name)
            .finish()
    }
}

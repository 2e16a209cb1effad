//! Bounded, one-shot device discovery
//!
//! A discovery call resolves exactly once. Announcements from other devices
//! are reported to the observer as progress; the first matching announcement
//! is reported through `on_found` and ends the call. The source is only read
//! while the call is running, so nothing can be observed after resolution,
//! and dropping the returned future stops listening immediately.

use fluxlink_core::{DeviceIdentity, DeviceMetadata};
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::announce::Announcement;
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::transport::{AnnouncementSource, UdpAnnouncementSource};

/// Receives discovery feedback
pub trait DiscoveryObserver: Send {
    /// An announcement arrived that does not answer the lookup
    fn on_progress(&mut self, _announcement: &Announcement) {}

    /// The announcement that resolved the lookup. Called at most once.
    fn on_found(&mut self, _announcement: &Announcement) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DiscoveryObserver for NoopObserver {}

/// Observer forwarding progress to a closure
pub struct ProgressFn<F>(F);

impl<F> DiscoveryObserver for ProgressFn<F>
where
    F: FnMut(&Announcement) + Send,
{
    fn on_progress(&mut self, announcement: &Announcement) {
        (self.0)(announcement)
    }
}

/// Wrap a closure as a progress observer
pub fn progress_fn<F>(f: F) -> ProgressFn<F>
where
    F: FnMut(&Announcement) + Send,
{
    ProgressFn(f)
}

/// Resolves a device identity into announced metadata
pub trait Discover: Send {
    /// Look up `identity`, failing with `DeviceNotFound` once `timeout`
    /// (measured from the call) has elapsed. `None` waits forever.
    fn discover(
        &mut self,
        identity: &DeviceIdentity,
        observer: &mut dyn DiscoveryObserver,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<DeviceMetadata, DiscoveryError>> + Send;
}

/// Discovery over an arbitrary announcement source
pub struct DiscoveryClient<S> {
    source: S,
    probe_interval: Duration,
}

impl<S: AnnouncementSource> DiscoveryClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            probe_interval: DiscoveryConfig::default().probe_interval(),
        }
    }

    pub fn with_probe_interval(mut self, probe_interval: Duration) -> Self {
        self.probe_interval = probe_interval.max(Duration::from_millis(1));
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn run(
        &mut self,
        identity: &DeviceIdentity,
        observer: &mut dyn DiscoveryObserver,
        timeout: Option<Duration>,
    ) -> Result<DeviceMetadata, DiscoveryError> {
        let started = Instant::now();
        let lookup = identity.lookup_mode().ok_or(DiscoveryError::Unidentifiable)?;
        // A deadline past the clock's range is as good as none
        let deadline = timeout.and_then(|t| started.checked_add(t));

        info!(lookup = %lookup, timeout = ?timeout, "Looking up device");

        self.source.probe(lookup).await?;

        let mut reprobe = interval_at(started + self.probe_interval, self.probe_interval);
        reprobe.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let announcement = tokio::select! {
                biased;
                result = self.source.recv() => result?,
                _ = reprobe.tick() => {
                    debug!(lookup = %lookup, "Re-sending discovery probe");
                    if let Err(e) = self.source.probe(lookup).await {
                        debug!(lookup = %lookup, error = %e, "Re-probe failed, still listening");
                    }
                    continue;
                }
                _ = wait_for(deadline) => {
                    debug!(lookup = %lookup, elapsed = ?started.elapsed(), "Lookup timed out");
                    return Err(DiscoveryError::DeviceNotFound { lookup });
                }
            };

            if announcement.matches(&lookup) {
                observer.on_found(&announcement);
                info!(
                    uuid = %announcement.metadata.uuid,
                    model_id = %announcement.metadata.model_id,
                    version = %announcement.metadata.version,
                    ipaddr = %announcement.metadata.ipaddr,
                    "Device found"
                );
                return Ok(announcement.metadata);
            }

            debug!(
                uuid = %announcement.metadata.uuid,
                source = %announcement.source,
                "Ignoring announcement from another device"
            );
            observer.on_progress(&announcement);
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl<S: AnnouncementSource> Discover for DiscoveryClient<S> {
    async fn discover(
        &mut self,
        identity: &DeviceIdentity,
        observer: &mut dyn DiscoveryObserver,
        timeout: Option<Duration>,
    ) -> Result<DeviceMetadata, DiscoveryError> {
        self.run(identity, observer, timeout).await
    }
}

/// Discovery over UDP, binding a fresh socket for each lookup
#[derive(Debug, Clone, Default)]
pub struct UdpDiscovery {
    config: DiscoveryConfig,
}

impl UdpDiscovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }
}

impl Discover for UdpDiscovery {
    async fn discover(
        &mut self,
        identity: &DeviceIdentity,
        observer: &mut dyn DiscoveryObserver,
        timeout: Option<Duration>,
    ) -> Result<DeviceMetadata, DiscoveryError> {
        let source = UdpAnnouncementSource::bind(&self.config).await?;
        let mut client =
            DiscoveryClient::new(source).with_probe_interval(self.config.probe_interval());
        client.run(identity, observer, timeout).await
    }
}

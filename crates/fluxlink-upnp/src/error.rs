//! Error types for negotiation and backend operations

use fluxlink_core::{LookupMode, StrictVersion, VersionError};
use fluxlink_discovery::DiscoveryError;
use thiserror::Error;

/// Failures reported by a backend
///
/// The task passes these through untouched; their meaning belongs to the
/// backend that raised them.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),
    #[error("Device rejected {operation}: {reason}")]
    Rejected { operation: String, reason: String },
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures while bringing a task up
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Device identity has neither a UUID nor an IP address")]
    InvalidIdentity,
    #[error(transparent)]
    MalformedVersion(#[from] VersionError),
    #[error("Device not found: no announcement for {lookup} before the lookup timeout")]
    DeviceNotFound { lookup: LookupMode },
    #[error("Discovery failed: {0}")]
    Discovery(DiscoveryError),
    #[error("No backend supports model {model_id} with firmware {version}")]
    UnsupportedDevice {
        model_id: String,
        version: StrictVersion,
    },
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl From<DiscoveryError> for TaskError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::DeviceNotFound { lookup } => TaskError::DeviceNotFound { lookup },
            DiscoveryError::Unidentifiable => TaskError::InvalidIdentity,
            other => TaskError::Discovery(other),
        }
    }
}

impl TaskError {
    /// Whether constructing a fresh task could succeed without changing
    /// configuration. Only a missed lookup or a transient socket error
    /// qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TaskError::DeviceNotFound { .. } | TaskError::Discovery(DiscoveryError::IoError(_))
        )
    }
}

//! fluxlink UPnP - Connect to a device through whichever backend supports it
//!
//! The pipeline behind [`UpnpTask`]:
//! 1. Resolve the device profile from supplied metadata or by discovery
//! 2. Pick the first registered backend whose predicate accepts the
//!    device's model and firmware version
//! 3. Forward every operation to that backend for the life of the task

pub mod backend;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod task;

pub use backend::{BackendCandidate, BackendContext, BackendOptions, DeviceSupport, UpnpBackend};
pub use error::{BackendError, TaskError};
pub use registry::{select, BackendRegistry, ProtocolGeneration};
pub use resolver::ProfileResolver;
pub use task::{UpnpTask, UpnpTaskBuilder};

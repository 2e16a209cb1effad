//! Backend registry and first-match selection

use fluxlink_core::{PreRelease, StrictVersion};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{BackendCandidate, DeviceSupport};
use crate::error::TaskError;

/// Index of the first candidate supporting the device
///
/// Candidates are scanned in the given order, so the result only depends on
/// the list and the (model, version) pair.
pub fn select<C: DeviceSupport>(
    model_id: &str,
    version: &StrictVersion,
    candidates: &[C],
) -> Result<usize, TaskError> {
    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.supports(model_id, version) {
            return Ok(index);
        }
        debug!(
            backend = candidate.name(),
            model_id = %model_id,
            version = %version,
            "Backend does not support device"
        );
    }

    Err(TaskError::UnsupportedDevice {
        model_id: model_id.to_string(),
        version: *version,
    })
}

/// Ordered list of backends, most capable first
#[derive(Clone, Default)]
pub struct BackendRegistry {
    candidates: Vec<Arc<dyn BackendCandidate>>,
}

impl BackendRegistry {
    pub fn new(candidates: Vec<Arc<dyn BackendCandidate>>) -> Self {
        Self { candidates }
    }

    /// Append a candidate with the lowest priority so far
    pub fn with(mut self, candidate: impl BackendCandidate + 'static) -> Self {
        self.candidates.push(Arc::new(candidate));
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    pub fn select(
        &self,
        model_id: &str,
        version: &StrictVersion,
    ) -> Result<&Arc<dyn BackendCandidate>, TaskError> {
        let index = select(model_id, version, &self.candidates)?;
        let candidate = &self.candidates[index];
        info!(
            backend = candidate.name(),
            model_id = %model_id,
            version = %version,
            "Backend selected"
        );
        Ok(candidate)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("candidates", &self.names())
            .finish()
    }
}

/// First firmware speaking the encrypted channel protocol
const SSL1_MIN_VERSION: StrictVersion = StrictVersion::new(1, 5, 0).with_pre(PreRelease::Beta(12));
/// Oldest firmware speaking the datagram protocol
const UDP1_MIN_VERSION: StrictVersion = StrictVersion::new(1, 0, 0);

const DELTA_MODELS: &[&str] = &["delta-1", "delta-1p"];
const SSL1_ONLY_MODELS: &[&str] = &["fbb1b", "fbb1p", "laser-b1"];

/// Known wire protocol generations, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolGeneration {
    /// Encrypted channel protocol
    Ssl1,
    /// Legacy datagram protocol
    Udp1,
}

impl ProtocolGeneration {
    /// Default priority order
    pub const ALL: [ProtocolGeneration; 2] = [ProtocolGeneration::Ssl1, ProtocolGeneration::Udp1];

    /// Generation a device would be driven with, if any
    pub fn for_device(model_id: &str, version: &StrictVersion) -> Result<Self, TaskError> {
        select(model_id, version, &Self::ALL).map(|index| Self::ALL[index])
    }
}

impl DeviceSupport for ProtocolGeneration {
    fn name(&self) -> &str {
        match self {
            ProtocolGeneration::Ssl1 => "ssl1",
            ProtocolGeneration::Udp1 => "udp1",
        }
    }

    fn supports(&self, model_id: &str, version: &StrictVersion) -> bool {
        match self {
            ProtocolGeneration::Ssl1 => {
                (DELTA_MODELS.contains(&model_id) || SSL1_ONLY_MODELS.contains(&model_id))
                    && *version >= SSL1_MIN_VERSION
            }
            ProtocolGeneration::Udp1 => {
                DELTA_MODELS.contains(&model_id)
                    && *version >= UDP1_MIN_VERSION
                    && *version < SSL1_MIN_VERSION
            }
        }
    }
}

impl fmt::Display for ProtocolGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> StrictVersion {
        s.parse().unwrap()
    }

    /// Predicate-only candidate: supports versions in [min, max)
    struct Range {
        name: &'static str,
        min: Option<StrictVersion>,
        max: Option<StrictVersion>,
    }

    impl DeviceSupport for Range {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, _model_id: &str, version: &StrictVersion) -> bool {
            self.min.map_or(true, |min| *version >= min)
                && self.max.map_or(true, |max| *version < max)
        }
    }

    fn new_and_old() -> Vec<Range> {
        vec![
            Range {
                name: "new",
                min: Some(v("2.0")),
                max: None,
            },
            Range {
                name: "old",
                min: Some(v("1.0")),
                max: Some(v("2.0")),
            },
        ]
    }

    #[test]
    fn test_select_first_match() {
        let candidates = new_and_old();
        assert_eq!(select("model-2", &v("2.5"), &candidates).unwrap(), 0);
        assert_eq!(select("model-2", &v("1.0"), &candidates).unwrap(), 1);
    }

    #[test]
    fn test_select_unsupported() {
        let err = select("model-2", &v("0.5"), &new_and_old()).unwrap_err();
        match err {
            TaskError::UnsupportedDevice { model_id, version } => {
                assert_eq!(model_id, "model-2");
                assert_eq!(version, v("0.5"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_select_prefers_earlier_overlap() {
        let candidates = vec![
            Range {
                name: "a",
                min: None,
                max: None,
            },
            Range {
                name: "b",
                min: None,
                max: None,
            },
        ];
        for _ in 0..10 {
            assert_eq!(select("any", &v("3.0"), &candidates).unwrap(), 0);
        }
    }

    #[test]
    fn test_select_empty_list() {
        let candidates: Vec<Range> = Vec::new();
        assert!(matches!(
            select("delta-1", &v("1.0"), &candidates),
            Err(TaskError::UnsupportedDevice { .. })
        ));
    }

    #[test]
    fn test_protocol_generation_thresholds() {
        assert_eq!(
            ProtocolGeneration::for_device("delta-1", &v("1.6.1")).unwrap(),
            ProtocolGeneration::Ssl1
        );
        assert_eq!(
            ProtocolGeneration::for_device("delta-1", &v("1.5b12")).unwrap(),
            ProtocolGeneration::Ssl1
        );
        assert_eq!(
            ProtocolGeneration::for_device("delta-1p", &v("1.5b11")).unwrap(),
            ProtocolGeneration::Udp1
        );
        assert_eq!(
            ProtocolGeneration::for_device("delta-1", &v("1.0")).unwrap(),
            ProtocolGeneration::Udp1
        );
        assert!(ProtocolGeneration::for_device("delta-1", &v("0.9.9")).is_err());
    }

    #[test]
    fn test_protocol_generation_models() {
        assert_eq!(
            ProtocolGeneration::for_device("fbb1b", &v("1.6")).unwrap(),
            ProtocolGeneration::Ssl1
        );
        assert!(ProtocolGeneration::for_device("fbb1b", &v("1.4")).is_err());
        assert!(ProtocolGeneration::for_device("toaster", &v("9.9")).is_err());
    }
}

//! Client credential material

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Not a PEM encoded key")]
    NotPem,
}

/// The client's key, handed to whichever backend talks to the device
///
/// Backends decide how the key is used; this type only carries it and
/// identifies it by fingerprint.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientKey {
    pem: String,
}

impl ClientKey {
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let pem = pem.trim();
        if !pem.starts_with("-----BEGIN ") || !pem.contains("-----END ") {
            return Err(KeyError::NotPem);
        }
        Ok(Self {
            pem: pem.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, KeyError> {
        let content = std::fs::read_to_string(path)?;
        let key = Self::from_pem(&content)?;
        debug!(path = %path.display(), fingerprint = %key.fingerprint(), "Loaded client key");
        Ok(key)
    }

    pub fn as_pem(&self) -> &str {
        &self.pem
    }

    /// SHA256 over the PEM text, hex encoded
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.pem.as_bytes()))
    }
}

impl fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

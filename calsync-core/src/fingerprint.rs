//! SHA-256 content fingerprints.
//!
//! Two payloads are the same for sync purposes iff their fingerprints are
//! equal. Empty or missing payloads have no fingerprint, so "nothing there"
//! never compares equal to real content.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint a payload. Returns `None` for an empty payload.
pub fn fingerprint(data: &[u8]) -> Option<Fingerprint> {
    if data.is_empty() {
        return None;
    }

    let mut hasher = Sha256::new();
    hasher.update(data);
    Some(Fingerprint(format!("{}{:x}", PREFIX, hasher.finalize())))
}

/// Fingerprint a file's contents. A missing file has no fingerprint.
pub fn fingerprint_file(path: &Path) -> std::io::Result<Option<Fingerprint>> {
    match std::fs::read(path) {
        Ok(data) => Ok(fingerprint(&data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

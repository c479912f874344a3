//! Content digests for asset change detection.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// A 256-bit SHA-256 content digest used to detect asset changes.
///
/// Two subtrees with the same `Digest` are assumed to have identical content.
/// Used throughout the toolchain to decide whether an externally generated
/// asset is still current or must be regenerated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Computes a digest of a single byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut writer = DigestWriter::new();
        writer.update(data);
        writer.finish()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental digest writer.
///
/// Accumulates byte chunks in call order; the final digest depends on the
/// concatenation of everything written. Used for the shared fallback bucket,
/// whose fingerprint covers every unidentified asset of a kind in document
/// order.
pub struct DigestWriter(Sha256);

impl DigestWriter {
    /// Creates a writer with no input consumed yet.
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    /// Feeds a chunk of bytes into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Consumes the writer and returns the digest of everything written.
    pub fn finish(self) -> Digest {
        Digest(self.0.finalize().into())
    }
}

impl Default for DigestWriter {
    fn default() -> Self {
        Self::new()
    }
}

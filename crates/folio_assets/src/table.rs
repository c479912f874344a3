//! The per-target fingerprint table and its on-disk form.
//!
//! One table file exists per build target, under that target's
//! generated-assets directory. The format is opaque and process-private:
//! magic bytes, a format version, then a `bincode` payload. Loading is
//! fail-safe; a missing, truncated, corrupt, or version-mismatched file
//! degrades to an empty table, which makes every asset stale — always safe,
//! never silently fresh.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use folio_common::Digest;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::kind::AssetKind;

/// Magic bytes identifying a Folio fingerprint-table file.
const TABLE_MAGIC: [u8; 4] = *b"FOLI";

/// Current table format version. Increment on breaking changes; old files
/// then load as empty tables instead of crashing.
const TABLE_FORMAT_VERSION: u32 = 1;

/// The fingerprints of one kind, keyed by identity.
///
/// The empty-string key is the shared bucket for nodes without a usable
/// identity; every kind present in a table carries it.
pub type KindEntries = BTreeMap<String, Digest>;

/// Mapping from asset kind to identity key to content fingerprint.
///
/// Kinds with no matching nodes in the source are omitted entirely, which
/// distinguishes "no assets of this kind" from "assets exist but none are
/// identified".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintTable {
    kinds: BTreeMap<AssetKind, KindEntries>,
}

impl FingerprintTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no kind has any fingerprint.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Records a fingerprint for `(kind, key)`.
    pub fn insert(&mut self, kind: AssetKind, key: impl Into<String>, digest: Digest) {
        self.kinds.entry(kind).or_default().insert(key.into(), digest);
    }

    /// The entries of one kind, if the kind is present.
    pub fn entries(&self, kind: AssetKind) -> Option<&KindEntries> {
        self.kinds.get(&kind)
    }

    /// The fingerprint of `(kind, key)`, if present.
    pub fn get(&self, kind: AssetKind, key: &str) -> Option<&Digest> {
        self.kinds.get(&kind).and_then(|e| e.get(key))
    }

    /// Iterates kinds and their entries in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &KindEntries)> {
        self.kinds.iter().map(|(k, e)| (*k, e))
    }

    /// Drops every kind that is absent from `fresh`.
    ///
    /// Run before diffing so that kinds removed from the source fall out of
    /// the table persisted at the end of the build.
    pub fn retain_kinds_of(&mut self, fresh: &FingerprintTable) {
        self.kinds.retain(|kind, _| fresh.kinds.contains_key(kind));
    }

    /// Adopts the whole entry set of `kind` from `fresh`.
    ///
    /// Called when a regenerate-all request for the kind succeeded. A kind
    /// absent from `fresh` is removed here too, though pruning normally
    /// prevents that case from arising.
    pub fn adopt_kind(&mut self, kind: AssetKind, fresh: &FingerprintTable) {
        match fresh.kinds.get(&kind) {
            Some(entries) => {
                self.kinds.insert(kind, entries.clone());
            }
            None => {
                self.kinds.remove(&kind);
            }
        }
    }

    /// Adopts a single `(kind, key)` fingerprint from `fresh`.
    ///
    /// Called when a regenerate-one request succeeded. Entries that failed
    /// to regenerate are never adopted, so they stay stale and the next
    /// build requests them again.
    pub fn adopt_entry(&mut self, kind: AssetKind, key: &str, fresh: &FingerprintTable) {
        if let Some(digest) = fresh.get(kind, key) {
            self.kinds
                .entry(kind)
                .or_default()
                .insert(key.to_string(), *digest);
        }
    }

    /// The table file path for a target: `<generated-dir>/.<name>_assets.bin`.
    pub fn path_for(generated_dir: &Path, target_name: &str) -> PathBuf {
        generated_dir.join(format!(".{target_name}_assets.bin"))
    }

    /// Loads a table from disk, degrading to an empty table on any failure.
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_default()
    }

    fn try_load(path: &Path) -> Option<Self> {
        let raw = std::fs::read(path).ok()?;
        if raw.len() < 8 {
            return None;
        }
        if raw[..4] != TABLE_MAGIC {
            return None;
        }
        let version = u32::from_le_bytes(raw[4..8].try_into().ok()?);
        if version != TABLE_FORMAT_VERSION {
            return None;
        }
        bincode::serde::decode_from_slice(&raw[8..], bincode::config::standard())
            .ok()
            .map(|(table, _)| table)
    }

    /// Persists the table, creating the parent directory if needed.
    ///
    /// Callers invoke this only after the dispatch pass has completed, so a
    /// crash mid-generation leaves the previous table on disk.
    pub fn save(&self, path: &Path) -> Result<(), AssetError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AssetError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| AssetError::Serialization {
                reason: e.to_string(),
            })?;
        let mut out = Vec::with_capacity(8 + payload.len());
        out.extend_from_slice(&TABLE_MAGIC);
        out.extend_from_slice(&TABLE_FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&payload);
        std::fs::write(path, &out).map_err(|e| AssetError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

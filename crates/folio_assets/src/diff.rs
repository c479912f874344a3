//! The diff engine: turning two fingerprint tables into regeneration work.

use std::fmt;

use crate::kind::AssetKind;
use crate::table::FingerprintTable;

/// An instruction to re-invoke the external converter for one asset kind.
///
/// `id: None` means "regenerate every instance of this kind"; `Some(key)`
/// scopes the converter to the subtree identified by that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenRequest {
    /// The asset kind to regenerate.
    pub kind: AssetKind,
    /// The identity key to restrict regeneration to, if any.
    pub id: Option<String>,
}

impl RegenRequest {
    /// A regenerate-all request for the kind.
    pub fn all(kind: AssetKind) -> Self {
        Self { kind, id: None }
    }

    /// A regenerate-one request for `(kind, id)`.
    pub fn one(kind: AssetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    /// Whether this request covers the whole kind.
    pub fn is_all(&self) -> bool {
        self.id.is_none()
    }
}

impl fmt::Display for RegenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}#{id}", self.kind),
            None => write!(f, "{} (all)", self.kind),
        }
    }
}

/// Compares a freshly computed table against the cached one and produces the
/// minimal set of regeneration requests.
///
/// Per kind present in `fresh`:
///
/// - absent from `cached` ⇒ one regenerate-all (first appearance has no
///   baseline, and converters batch a whole kind cheaply);
/// - the `""` bucket digest differs ⇒ one regenerate-all (bucket membership
///   or content changed ambiguously; no subset can be targeted), subsuming
///   any per-key drift;
/// - otherwise, one regenerate-one per identified key whose digest differs.
///
/// Kinds present only in `cached` produce nothing: the asset type left the
/// source, and pruning keeps it out of the table persisted after the run.
/// Equal tables produce an empty result.
pub fn diff(fresh: &FingerprintTable, cached: &FingerprintTable) -> Vec<RegenRequest> {
    let mut requests = Vec::new();
    for (kind, fresh_entries) in fresh.iter() {
        let cached_entries = match cached.entries(kind) {
            None => {
                requests.push(RegenRequest::all(kind));
                continue;
            }
            Some(entries) => entries,
        };
        if fresh_entries.get("") != cached_entries.get("") {
            requests.push(RegenRequest::all(kind));
            continue;
        }
        for (key, digest) in fresh_entries {
            if key.is_empty() {
                continue;
            }
            if cached_entries.get(key) != Some(digest) {
                requests.push(RegenRequest::one(kind, key.clone()));
            }
        }
    }
    requests
}

//! Fresh fingerprint computation: content hashing plus identity resolution.

use folio_common::{Digest, DigestWriter};
use folio_source::{canonical_bytes, nearest_id};
use roxmltree::Document;

use crate::kind::AssetKind;
use crate::table::FingerprintTable;

/// Computes the fingerprint table of a source tree for the given kinds.
///
/// For each kind, matching nodes are visited in document order and
/// partitioned by identity:
///
/// - a node with an `xml:id` (its own, or the nearest ancestor's) claims
///   that key exclusively, first claim wins;
/// - every other node — no identity, or its key already claimed — rolls
///   into the kind's shared `""` bucket;
/// - all-or-nothing kinds skip identity resolution entirely: their
///   converter cannot regenerate a subset, so every node buckets.
///
/// A kind with no matching nodes is omitted from the table. A kind with any
/// matching node always carries the `""` entry, even when every node is
/// identified; the bucket digest is then the hash of no input, which is
/// stable across builds.
pub fn fingerprint_source(doc: &Document<'_>, kinds: &[AssetKind]) -> FingerprintTable {
    let mut table = FingerprintTable::new();
    for &kind in kinds {
        let nodes = kind.query_nodes(doc);
        if nodes.is_empty() {
            continue;
        }
        let mut bucket = DigestWriter::new();
        for node in &nodes {
            let claimed = if kind.is_monolithic() {
                None
            } else {
                nearest_id(node).filter(|id| table.get(kind, id).is_none())
            };
            match claimed {
                Some(id) => {
                    table.insert(kind, id, Digest::from_bytes(&canonical_bytes(node)));
                }
                None => bucket.update(&canonical_bytes(node)),
            }
        }
        table.insert(kind, "", bucket.finish());
    }
    table
}

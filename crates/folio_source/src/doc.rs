//! Owned source documents and canonical subtree serialization.

use std::path::Path;

use roxmltree::{Document, Node, NodeType};

use crate::error::SourceError;

/// The `xml:` namespace URI, used to resolve `xml:id` attributes.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// An XML source document, held as owned text and parsed on demand.
///
/// The parsed tree borrows from the text, so callers obtain a fresh
/// [`Document`] via [`SourceDoc::parse`] and keep it alive only for the
/// duration of a traversal. The tree is read-only; Folio never mutates
/// source markup.
#[derive(Debug)]
pub struct SourceDoc {
    text: String,
}

impl SourceDoc {
    /// Reads a source document from disk.
    ///
    /// The text is not parsed here; parse errors surface from
    /// [`SourceDoc::parse`].
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { text })
    }

    /// Creates a document from in-memory text. Useful for testing.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Parses the held text into an element tree.
    pub fn parse(&self) -> Result<Document<'_>, SourceError> {
        Document::parse(&self.text).map_err(|e| SourceError::Parse {
            reason: e.to_string(),
        })
    }
}

/// Returns the explicit `xml:id` attribute of a node, if any.
pub fn node_id<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.attribute((XML_NS, "id"))
}

/// Returns the `xml:id` of the node itself or of its nearest ancestor.
///
/// Walks upward from the node; the first element carrying an `xml:id`
/// wins. Returns `None` when no element on the path to the root is
/// identified.
pub fn nearest_id<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    node.ancestors().find_map(|n| node_id(&n))
}

/// Serializes an element subtree into canonical bytes for hashing.
///
/// The form is order-preserving and namespace-qualified: tag names and
/// attribute names are written as `{namespace}local`, attributes in document
/// order, text content verbatim, children recursively. Comments and
/// processing instructions are not part of an asset's content and are
/// skipped. Formatting *around* the node never appears in its own
/// serialization, so reindenting a document does not change any digest.
pub fn canonical_bytes(node: &Node<'_, '_>) -> Vec<u8> {
    let mut out = Vec::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node<'_, '_>, out: &mut Vec<u8>) {
    match node.node_type() {
        NodeType::Element => {
            out.push(b'<');
            write_name(node.tag_name().namespace(), node.tag_name().name(), out);
            for attr in node.attributes() {
                out.push(b' ');
                write_name(attr.namespace(), attr.name(), out);
                out.push(b'=');
                out.push(b'"');
                out.extend_from_slice(attr.value().as_bytes());
                out.push(b'"');
            }
            out.push(b'>');
            for child in node.children() {
                write_node(&child, out);
            }
            out.extend_from_slice(b"</");
            write_name(node.tag_name().namespace(), node.tag_name().name(), out);
            out.push(b'>');
        }
        NodeType::Text => {
            if let Some(text) = node.text() {
                out.extend_from_slice(text.as_bytes());
            }
        }
        // Root, comments, and processing instructions carry no asset content.
        _ => {}
    }
}

fn write_name(namespace: Option<&str>, name: &str, out: &mut Vec<u8>) {
    if let Some(ns) = namespace {
        out.push(b'{');
        out.extend_from_slice(ns.as_bytes());
        out.push(b'}');
    }
    out.extend_from_slice(name.as_bytes());
}

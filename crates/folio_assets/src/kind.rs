//! The closed set of asset kinds and their static dispatch data.

use folio_common::DocFormat;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A category of source-embedded asset requiring external generation.
///
/// Each kind carries, as static data, the query locating its nodes in the
/// source tree, its output subdirectory, the output formats it produces per
/// document format, and whether it can be regenerated per identity or only
/// as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// Computed plot images (`<plot>`).
    Plot,
    /// Compiled diagram images (`<diagram>`).
    Diagram,
    /// Exercise banks (`<exercise-bank>` with content); extracted from the
    /// whole source in one converter pass.
    ExerciseBank,
    /// Thumbnails for remotely hosted videos (`<video remote="...">`).
    VideoThumbnail,
    /// Static preview images of interactive widgets (`<interactive>`).
    InteractivePreview,
    /// Packaged data files (`<datafile>`).
    DataFile,
}

impl AssetKind {
    /// All kinds, in the order they are considered during a build.
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Plot,
        AssetKind::Diagram,
        AssetKind::ExerciseBank,
        AssetKind::VideoThumbnail,
        AssetKind::InteractivePreview,
        AssetKind::DataFile,
    ];

    /// The kebab-case name used in logs and on the CLI.
    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Plot => "plot",
            AssetKind::Diagram => "diagram",
            AssetKind::ExerciseBank => "exercise-bank",
            AssetKind::VideoThumbnail => "video-thumbnail",
            AssetKind::InteractivePreview => "interactive-preview",
            AssetKind::DataFile => "data-file",
        }
    }

    /// Parses a kind from its kebab-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The subdirectory of the generated-assets directory this kind's
    /// converter writes into.
    pub fn dir(self) -> &'static str {
        match self {
            AssetKind::Plot => "plot",
            AssetKind::Diagram => "diagram",
            AssetKind::ExerciseBank => "exercises",
            AssetKind::VideoThumbnail => "thumbnail",
            AssetKind::InteractivePreview => "preview",
            AssetKind::DataFile => "datafile",
        }
    }

    /// Whether this kind's converter processes the whole source in one pass.
    ///
    /// All-or-nothing kinds never track per-identity fingerprints: every
    /// matching node accumulates into the shared bucket, and any change
    /// regenerates the kind in full.
    pub fn is_monolithic(self) -> bool {
        matches!(self, AssetKind::ExerciseBank)
    }

    /// Whether this kind participates in builds of the given document format.
    ///
    /// Thumbnails and interactive previews only exist to stand in for live
    /// embeds, so HTML output skips them.
    pub fn supported_for(self, format: DocFormat) -> bool {
        match self {
            AssetKind::VideoThumbnail | AssetKind::InteractivePreview => {
                !matches!(format, DocFormat::Html)
            }
            _ => true,
        }
    }

    /// The output formats the converter is asked to produce for the given
    /// document format.
    ///
    /// An empty list means the converter has a single canonical output for
    /// this kind and takes no format arguments.
    pub fn output_formats(self, format: DocFormat) -> &'static [&'static str] {
        match self {
            AssetKind::Plot => match format {
                DocFormat::Html => &["html", "svg"],
                DocFormat::Pdf | DocFormat::Latex => &["pdf", "png"],
                DocFormat::Epub => &["svg"],
            },
            AssetKind::Diagram => match format {
                DocFormat::Html | DocFormat::Epub => &["svg"],
                DocFormat::Pdf | DocFormat::Latex => &["pdf"],
            },
            AssetKind::VideoThumbnail | AssetKind::InteractivePreview => &["png"],
            AssetKind::ExerciseBank | AssetKind::DataFile => &[],
        }
    }

    /// Collects this kind's nodes from the source tree, in document order.
    pub fn query_nodes<'a, 'input>(self, doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
        doc.descendants().filter(|n| self.matches(n)).collect()
    }

    /// Whether a single node belongs to this kind.
    fn matches(self, node: &Node<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }
        let tag = node.tag_name().name();
        match self {
            AssetKind::Plot => tag == "plot",
            AssetKind::Diagram => tag == "diagram",
            // An empty placeholder bank is not an asset; require content.
            AssetKind::ExerciseBank => {
                tag == "exercise-bank"
                    && (node.attributes().next().is_some()
                        || node.children().any(|c| c.is_element()))
            }
            AssetKind::VideoThumbnail => tag == "video" && node.attribute("remote").is_some(),
            AssetKind::InteractivePreview => tag == "interactive",
            AssetKind::DataFile => tag == "datafile",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Asset manifest model.
//!
//! # Module Structure
//!
//! ```text
//! manifest/
//! ├── load       # file → ManifestNode (JSON or TOML)
//! ├── locate     # manifest path → file on disk
//! ├── resolve    # ManifestNode → ResolvedNode (content hashes)
//! ├── flatten    # ResolvedNode → Vec<CopyPair>
//! └── mod.rs     # tree types (this file)
//! ```
//!
//! A manifest groups source paths under nested keys:
//!
//! ```json
//! { "app": { "js": ["src/app.js"], "css": ["src/app.css"] } }
//! ```
//!
//! Resolution keeps that shape, replacing every path list with a mapping
//! of original path to hashed path. Flattening then turns the tree into
//! copy instructions under the output directory.

mod flatten;
mod load;
mod locate;
mod resolve;

pub use flatten::{CopyPair, flatten};
pub use load::load_manifest;
pub use locate::SourceLocator;
pub use resolve::HashResolver;

use serde::Serialize;
use std::collections::BTreeMap;

/// Input manifest tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestNode {
    /// Ordered list of source paths.
    Leaf(Vec<String>),
    /// Named sub-groups.
    Group(BTreeMap<String, ManifestNode>),
}

impl ManifestNode {
    /// Number of path entries across all leaves.
    pub fn path_count(&self) -> usize {
        match self {
            Self::Leaf(paths) => paths.len(),
            Self::Group(children) => children.values().map(Self::path_count).sum(),
        }
    }
}

/// Manifest tree after hashing: leaves map original → hashed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedNode {
    Leaf(BTreeMap<String, String>),
    Group(BTreeMap<String, ResolvedNode>),
}

/// Original source path → deployed destination path.
pub type FinalManifest = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_count() {
        let node = ManifestNode::Group(BTreeMap::from([
            ("a".into(), ManifestNode::Leaf(vec!["x.js".into(), "y.js".into()])),
            (
                "b".into(),
                ManifestNode::Group(BTreeMap::from([(
                    "c".into(),
                    ManifestNode::Leaf(vec!["z.css".into()]),
                )])),
            ),
        ]));
        assert_eq!(node.path_count(), 3);
    }

    #[test]
    fn test_resolved_serializes_as_plain_tree() {
        let node = ResolvedNode::Group(BTreeMap::from([(
            "js".into(),
            ResolvedNode::Leaf(BTreeMap::from([("x.js".into(), "x.h1.js".into())])),
        )]));
        assert_eq!(
            serde_json::to_string(&node).unwrap(),
            r#"{"js":{"x.js":"x.h1.js"}}"#
        );
    }
}

//! Resolved tree → flat copy instructions.
//!
//! ```text
//! {a: {b: {"x.js": "x.h1.js"}}}  +  "dist"
//!   → CopyPair { source: "x.js", destination: "dist/a/b/x.h1.js" }
//! ```

use std::path::Path;

use super::ResolvedNode;
use crate::asset::AssetError;
use crate::utils::path::stays_within;

/// One file to materialize under the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CopyPair {
    /// Original manifest path.
    pub source: String,
    /// Slash-joined output path: prefix, group keys, hashed path.
    pub destination: String,
}

impl CopyPair {
    /// Destination with `prefix/` removed.
    pub fn relative_destination<'a>(&'a self, prefix: &str) -> &'a str {
        let prefix = normalize_prefix(prefix);
        if prefix.is_empty() {
            return &self.destination;
        }
        self.destination
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&self.destination)
    }

    /// Reject destinations that would land outside `prefix`.
    ///
    /// `..` segments are allowed as long as they never climb above it.
    pub fn ensure_contained(&self, prefix: &str) -> Result<(), AssetError> {
        if !stays_within(Path::new(self.relative_destination(prefix))) {
            return Err(AssetError::UnsafeDestination {
                path: self.destination.clone(),
            });
        }
        Ok(())
    }
}

/// Flatten a resolved tree into copy pairs under `prefix`.
///
/// Group keys become directory segments; a leaf emits one pair per entry.
/// Output follows sorted key order.
pub fn flatten(node: &ResolvedNode, prefix: &str) -> Vec<CopyPair> {
    let mut pairs = Vec::new();
    flatten_into(node, normalize_prefix(prefix), &mut pairs);
    pairs
}

fn flatten_into(node: &ResolvedNode, prefix: &str, out: &mut Vec<CopyPair>) {
    match node {
        ResolvedNode::Leaf(entries) => {
            out.extend(entries.iter().map(|(source, hashed)| CopyPair {
                source: source.clone(),
                destination: join(prefix, hashed),
            }));
        }
        ResolvedNode::Group(children) => {
            for (key, child) in children {
                flatten_into(child, &join(prefix, key), out);
            }
        }
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}/{segment}")
    }
}

fn normalize_prefix(prefix: &str) -> &str {
    match prefix.trim_end_matches('/') {
        "" if prefix.starts_with('/') => "/",
        trimmed => trimmed,
    }
}

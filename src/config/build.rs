//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! manifest = "manifest.json"      # Input manifest (.json or .toml)
//! output = "dist"                 # Destination root
//! manifest_name = "manifest.json" # Final manifest file inside `output`
//! roots = [".", "node_modules"]   # Search roots for manifest source paths
//! jobs = 16                       # Max concurrent file operations
//! hash_length = 16                # Hex chars kept from the blake3 digest
//! pretty = false                  # Pretty-print the final manifest
//! relative_paths = false          # Store manifest values relative to `output`
//! ```
//!
//! Paths are relative to the directory holding `stamp.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::asset::hash::{MAX_HASH_LENGTH, MIN_HASH_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Input manifest file.
    pub manifest: PathBuf,

    /// Destination root for hashed assets.
    pub output: PathBuf,

    /// File name of the final manifest written inside `output`.
    pub manifest_name: String,

    /// Directories searched, in order, for manifest source paths.
    pub roots: Vec<PathBuf>,

    /// Maximum number of file operations in flight.
    pub jobs: usize,

    /// Number of hex characters kept from each content hash.
    pub hash_length: usize,

    /// Pretty-print the final manifest.
    pub pretty: bool,

    /// Store destinations relative to `output` instead of prefixed with it.
    pub relative_paths: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            manifest: "manifest.json".into(),
            output: "dist".into(),
            manifest_name: "manifest.json".into(),
            roots: vec![".".into()],
            jobs: 16,
            hash_length: 16,
            pretty: false,
            relative_paths: false,
        }
    }
}

impl BuildSectionConfig {
    /// Collect validation errors for this section.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.jobs == 0 {
            errors.push("[build.jobs] must be at least 1".into());
        }

        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&self.hash_length) {
            errors.push(format!(
                "[build.hash_length] must be between {MIN_HASH_LENGTH} and {MAX_HASH_LENGTH}, got {}",
                self.hash_length
            ));
        }

        if !is_bare_file_name(&self.manifest_name) {
            errors.push(format!(
                "[build.manifest_name] must be a plain file name, got `{}`",
                self.manifest_name
            ));
        }

        if self.roots.is_empty() {
            errors.push("[build.roots] must list at least one directory".into());
        }
    }
}

fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

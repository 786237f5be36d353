//! Streaming copy that rewrites source-map references.
//!
//! The asset is read one `\n`-terminated line at a time. A line such as
//!
//! ```text
//! //# sourceMappingURL=app.js.map
//! /*# sourceMappingURL=app.css.map */
//! ```
//!
//! has its map copied next to the destination under a hashed name and the
//! URL replaced in place. Every other line is written back byte for byte,
//! so binary assets pass through untouched.
//!
//! Lines are handled strictly in order: the map copy for line N completes
//! before line N+1 is read.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::bytes::Regex;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

use super::error::{AssetError, IoPathExt};
use super::hash::{ContentHash, insert_map_hash};
use crate::debug;
use crate::utils::path::stays_within;

/// `<prefix><#|@> sourceMappingURL=<url><suffix>`
static SOURCE_MAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^(.*[#@]\s*sourceMappingURL=)(\S+)(.*)$").unwrap()
});

/// Summary of one copied asset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    /// Lines streamed from source to destination.
    pub lines: usize,
    /// Source-map references replaced with hashed names.
    pub maps_rewritten: usize,
}

/// Copies assets while rewriting their source-map references.
#[derive(Debug, Clone)]
pub struct SourceMapRewriter {
    hash_length: usize,
    /// Map copies must stay under this directory when set.
    root: Option<PathBuf>,
}

impl SourceMapRewriter {
    pub const fn new(hash_length: usize) -> Self {
        Self {
            hash_length,
            root: None,
        }
    }

    /// Refuse map references that would be copied outside `root`.
    pub fn within(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Stream `source` into `dest`, rewriting source-map lines on the way.
    ///
    /// The parent of `dest` must already exist. An existing `dest` is
    /// overwritten.
    pub async fn copy(&self, source: &Path, dest: &Path) -> Result<CopyOutcome, AssetError> {
        let input = File::open(source).await.at(source)?;
        let output = File::create(dest).await.at(dest)?;

        let source_dir = source.parent().unwrap_or_else(|| Path::new(""));
        let dest_dir = dest.parent().unwrap_or_else(|| Path::new(""));

        let mut reader = BufReader::new(input);
        let mut writer = BufWriter::new(output);
        let mut outcome = CopyOutcome::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await.at(source)? == 0 {
                break;
            }
            outcome.lines += 1;

            match self.rewrite_line(&line, source_dir, dest_dir).await? {
                Some(rewritten) => {
                    writer.write_all(&rewritten).await.at(dest)?;
                    outcome.maps_rewritten += 1;
                }
                None => writer.write_all(&line).await.at(dest)?,
            }
        }

        writer.flush().await.at(dest)?;
        Ok(outcome)
    }

    /// Returns the replacement line, or `None` to keep the original bytes.
    async fn rewrite_line(
        &self,
        line: &[u8],
        source_dir: &Path,
        dest_dir: &Path,
    ) -> Result<Option<Vec<u8>>, AssetError> {
        let (body, newline) = match line.strip_suffix(b"\n") {
            Some(body) => (body, &b"\n"[..]),
            None => (line, &b""[..]),
        };

        let Some(caps) = SOURCE_MAP_RE.captures(body) else {
            return Ok(None);
        };
        let (prefix, url, suffix) = (&caps[1], &caps[2], &caps[3]);
        let Ok(url) = std::str::from_utf8(url) else {
            return Ok(None);
        };

        let Some(hashed) = self.copy_source_map(url, source_dir, dest_dir).await? else {
            return Ok(None);
        };

        let mut out = Vec::with_capacity(line.len() + hashed.len());
        out.extend_from_slice(prefix);
        out.extend_from_slice(hashed.as_bytes());
        out.extend_from_slice(suffix);
        out.extend_from_slice(newline);
        Ok(Some(out))
    }

    /// Copy the map named by `url` next to the destination asset.
    ///
    /// Returns the hashed URL, or `None` when the reference is left alone
    /// (remote/absolute URL, or the map does not exist).
    async fn copy_source_map(
        &self,
        url: &str,
        source_dir: &Path,
        dest_dir: &Path,
    ) -> Result<Option<String>, AssetError> {
        if !is_sibling_reference(url) {
            debug!("sourcemap"; "skipping non-local reference `{}`", url);
            return Ok(None);
        }
        self.ensure_contained(url, dest_dir)?;

        let original = source_dir.join(url);
        let bytes = match fs::read(&original).await.at(&original) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                debug!("sourcemap"; "map not found, keeping reference: {}", original.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let hashed = insert_map_hash(url, &ContentHash::of(&bytes).fingerprint(self.hash_length));
        let target = dest_dir.join(&hashed);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.at(parent)?;
        }

        match write_new(&target, &bytes).await {
            Ok(()) => debug!("sourcemap"; "{} -> {}", original.display(), target.display()),
            Err(e) if e.is_already_exists() => {
                debug!("sourcemap"; "reusing existing {}", target.display());
            }
            Err(e) => return Err(e),
        }

        Ok(Some(hashed))
    }

    /// Check that `url`, followed from `dest_dir`, stays under the root.
    fn ensure_contained(&self, url: &str, dest_dir: &Path) -> Result<(), AssetError> {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let inside = dest_dir
            .strip_prefix(root)
            .is_ok_and(|relative| stays_within(&relative.join(url)));
        if inside {
            Ok(())
        } else {
            Err(AssetError::UnsafeDestination {
                path: dest_dir.join(url).display().to_string(),
            })
        }
    }
}

/// Whether `url` names a file relative to the asset.
fn is_sibling_reference(url: &str) -> bool {
    !url.starts_with('/') && !url.starts_with('\\') && url::Url::parse(url).is_err()
}

/// Write `bytes` to a file that must not exist yet.
async fn write_new(path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .at(path)?;
    file.write_all(bytes).await.at(path)?;
    file.flush().await.at(path)
}

//! Content hashing and hash-inserted file names.
//!
//! Fingerprints are blake3 digests rendered as lowercase hex and truncated
//! to a configured length:
//!
//! ```text
//! css/app.css + "abc123"  →  css/app.abc123.css
//! ```

/// Shortest fingerprint accepted by configuration.
pub const MIN_HASH_LENGTH: usize = 8;
/// Full blake3 digest length in hex characters.
pub const MAX_HASH_LENGTH: usize = 64;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte buffer.
    #[inline]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Convert to the full 64-char hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Hex fingerprint truncated to `len` characters (clamped to 1..=64).
    pub fn fingerprint(self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.clamp(1, MAX_HASH_LENGTH));
        hex
    }
}

/// Insert `hash` immediately before the final extension of `path`.
///
/// Only the file-name segment is considered; directory segments are copied
/// through untouched.
///
/// - `css/app.css`     → `css/app.<hash>.css`
/// - `app.min.js`      → `app.min.<hash>.js`
/// - `.babelrc`        → `.<hash>.babelrc`
/// - `LICENSE`         → `LICENSE.<hash>`
pub fn insert_hash(path: &str, hash: &str) -> String {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let (dir, name) = path.split_at(name_start);

    match name.rfind('.') {
        Some(dot) => {
            let (stem, ext) = name.split_at(dot);
            format!("{dir}{stem}.{hash}{ext}")
        }
        None => format!("{dir}{name}.{hash}"),
    }
}

/// Insert `hash` into a source-map file name.
///
/// Maps are named after their asset (`app.js.map`), so the hash goes before
/// the asset's extension to keep the `.js.map` pair intact:
/// `app.js.map` → `app.<hash>.js.map`. Names without that shape fall back
/// to [`insert_hash`].
pub fn insert_map_hash(path: &str, hash: &str) -> String {
    let Some(asset) = path.strip_suffix(".map") else {
        return insert_hash(path, hash);
    };

    let name_start = asset.rfind('/').map_or(0, |i| i + 1);
    match asset[name_start..].rfind('.') {
        Some(dot) if dot > 0 => format!("{}.map", insert_hash(asset, hash)),
        _ => insert_hash(path, hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_hash_with_directory() {
        assert_eq!(insert_hash("css/app.css", "abc123"), "css/app.abc123.css");
        assert_eq!(insert_hash("a/b.js", "deadbeef"), "a/b.deadbeef.js");
    }

    #[test]
    fn test_insert_hash_without_directory() {
        assert_eq!(insert_hash("app.js", "h1"), "app.h1.js");
    }

    #[test]
    fn test_insert_hash_multiple_dots() {
        assert_eq!(insert_hash("vendor/app.min.js", "ff"), "vendor/app.min.ff.js");
        assert_eq!(insert_hash("app.js.map", "h2"), "app.js.h2.map");
    }

    #[test]
    fn test_insert_map_hash() {
        assert_eq!(insert_map_hash("app.js.map", "h2"), "app.h2.js.map");
        assert_eq!(insert_map_hash("maps/app.css.map", "h2"), "maps/app.h2.css.map");
        assert_eq!(insert_map_hash("bundle.map", "h2"), "bundle.h2.map");
        assert_eq!(insert_map_hash(".js.map", "h2"), ".js.h2.map");
        assert_eq!(insert_map_hash("app.json", "h2"), "app.h2.json");
    }

    #[test]
    fn test_insert_hash_ignores_dots_in_directories() {
        assert_eq!(insert_hash("v1.2/app", "ff"), "v1.2/app.ff");
        assert_eq!(insert_hash("./src/app.js", "ff"), "./src/app.ff.js");
    }

    #[test]
    fn test_insert_hash_edge_names() {
        assert_eq!(insert_hash("LICENSE", "ff"), "LICENSE.ff");
        assert_eq!(insert_hash(".babelrc", "ff"), ".ff.babelrc");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = ContentHash::of(b"body { color: red; }");
        let b = ContentHash::of(b"body { color: red; }");
        let c = ContentHash::of(b"body { color: blue; }");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.fingerprint(16).len(), 16);
        assert_eq!(a.fingerprint(100).len(), MAX_HASH_LENGTH);
        assert!(a.to_hex().starts_with(&a.fingerprint(8)));
    }
}

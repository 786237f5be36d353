//! Source path lookup across search roots.

use std::path::{Path, PathBuf};

/// Resolves manifest source paths to files on disk.
///
/// Roots are tried in order; the first one containing the file wins. When
/// no root has it, the path under the first root is returned so the read
/// error names a concrete location.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    roots: Vec<PathBuf>,
}

impl SourceLocator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Locate `source` on disk.
    pub async fn locate(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            return path.to_path_buf();
        }

        for root in &self.roots {
            let candidate = root.join(path);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
        }

        match self.roots.first() {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_matching_root_wins() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("src");
        let second = dir.path().join("node_modules");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(second.join("lib")).unwrap();
        fs::write(second.join("lib/x.js"), "x").unwrap();

        let locator = SourceLocator::new(vec![first.clone(), second.clone()]);
        assert_eq!(locator.locate("lib/x.js").await, second.join("lib/x.js"));
    }

    #[tokio::test]
    async fn test_missing_falls_back_to_first_root() {
        let dir = TempDir::new().unwrap();
        let locator = SourceLocator::new(vec![dir.path().join("a"), dir.path().join("b")]);
        assert_eq!(locator.locate("x.js").await, dir.path().join("a/x.js"));
    }

    #[tokio::test]
    async fn test_absolute_path_is_kept() {
        let locator = SourceLocator::new(vec![PathBuf::from("/root")]);
        assert_eq!(
            locator.locate("/abs/x.js").await,
            PathBuf::from("/abs/x.js")
        );
    }
}

//! Asset I/O errors.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure while reading, hashing, or writing an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("file not found: `{}`", path.display())]
    NotFound { path: PathBuf },

    #[error("file already exists: `{}`", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("IO error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination escapes the output directory: `{path}`")]
    UnsafeDestination { path: String },
}

impl AssetError {
    /// Classify an `io::Error` raised while touching `path`.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Io { path, source },
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Attach a path to `io::Result` values.
pub trait IoPathExt<T> {
    fn at(self, path: impl AsRef<Path>) -> Result<T, AssetError>;
}

impl<T> IoPathExt<T> for io::Result<T> {
    #[inline]
    fn at(self, path: impl AsRef<Path>) -> Result<T, AssetError> {
        self.map_err(|e| AssetError::from_io(path, e))
    }
}

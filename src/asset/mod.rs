//! Asset fingerprinting and copying.

mod error;
pub mod hash;
mod sourcemap;

pub use error::{AssetError, IoPathExt};
pub use hash::{ContentHash, insert_hash};
pub use sourcemap::{CopyOutcome, SourceMapRewriter};

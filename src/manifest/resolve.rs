//! Content-hash resolution over the manifest tree.

use std::collections::BTreeMap;

use futures_util::future::{LocalBoxFuture, try_join_all};

use super::{ManifestNode, ResolvedNode, SourceLocator};
use crate::asset::{AssetError, ContentHash, IoPathExt, insert_hash};
use crate::debug;
use crate::logger::ProgressLine;
use crate::utils::task::JobLimit;

/// Walks a manifest and assigns every source path its hashed name.
///
/// Siblings are resolved concurrently; file reads share the pipeline's
/// [`JobLimit`]. The first unreadable file fails the whole resolution.
pub struct HashResolver<'a> {
    locator: &'a SourceLocator,
    limit: &'a JobLimit,
    hash_length: usize,
    progress: Option<&'a ProgressLine>,
}

impl<'a> HashResolver<'a> {
    pub fn new(locator: &'a SourceLocator, limit: &'a JobLimit, hash_length: usize) -> Self {
        Self {
            locator,
            limit,
            hash_length,
            progress: None,
        }
    }

    /// Report each hashed file to a progress counter named `hash`.
    pub fn with_progress(mut self, progress: Option<&'a ProgressLine>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn resolve(&self, node: &ManifestNode) -> Result<ResolvedNode, AssetError> {
        self.resolve_node(node).await
    }

    fn resolve_node<'s>(
        &'s self,
        node: &'s ManifestNode,
    ) -> LocalBoxFuture<'s, Result<ResolvedNode, AssetError>> {
        Box::pin(async move {
            match node {
                ManifestNode::Leaf(paths) => self.resolve_leaf(paths).await.map(ResolvedNode::Leaf),
                ManifestNode::Group(children) => {
                    let resolved = try_join_all(children.iter().map(move |(key, child)| async move {
                        Ok::<_, AssetError>((key.clone(), self.resolve_node(child).await?))
                    }))
                    .await?;
                    Ok(ResolvedNode::Group(resolved.into_iter().collect()))
                }
            }
        })
    }

    async fn resolve_leaf(&self, paths: &[String]) -> Result<BTreeMap<String, String>, AssetError> {
        let entries = try_join_all(paths.iter().map(move |path| self.hash_path(path))).await?;
        Ok(entries.into_iter().collect())
    }

    async fn hash_path(&self, source: &str) -> Result<(String, String), AssetError> {
        let file = self.locator.locate(source).await;
        let bytes = self
            .limit
            .run(async { tokio::fs::read(&file).await.at(&file) })
            .await?;

        let hash = ContentHash::of(&bytes).fingerprint(self.hash_length);
        let hashed = insert_hash(source, &hash);
        debug!("hash"; "{} -> {}", source, hashed);

        if let Some(progress) = self.progress {
            progress.inc("hash");
        }
        Ok((source.to_string(), hashed))
    }
}

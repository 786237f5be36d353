//! Asset build orchestration.
//!
//! Build pipeline phases:
//! - **Init** - Create output directory, load manifest
//! - **Resolving** - Content-hash every manifest path
//! - **Flattening** - Turn the resolved tree into copy pairs under the output
//! - **Copying** - Stream assets to their hashed names, rewriting source maps
//! - **Manifesting** - Write the final `source -> destination` manifest
//!
//! A failure in any phase ends the run in `failed` without writing the final
//! manifest. Files copied before the failure are left in place.

use crate::{
    asset::{AssetError, CopyOutcome, IoPathExt, SourceMapRewriter},
    config::StampConfig,
    debug, log,
    logger::ProgressLine,
    manifest::{
        CopyPair, FinalManifest, HashResolver, ManifestNode, ResolvedNode, SourceLocator, flatten,
        load_manifest,
    },
    utils::{
        plural_count,
        task::{JobLimit, join_all_first_error},
    },
};
use anyhow::{Context, Result};
use std::{
    cell::Cell,
    collections::BTreeMap,
    fmt,
    path::PathBuf,
};

/// Pipeline state, entered in declaration order until `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Resolving,
    Flattening,
    Copying,
    Manifesting,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Resolving => "resolving",
            Self::Flattening => "flattening",
            Self::Copying => "copying",
            Self::Manifesting => "manifesting",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Summary of a successful run.
#[derive(Debug)]
pub struct BuildReport {
    /// Where the final manifest was written.
    pub manifest_path: PathBuf,
    pub manifest: FinalManifest,
    /// Distinct destination files written.
    pub assets: usize,
    /// Source-map references rewritten across all assets.
    pub source_maps: usize,
}

/// Run the build and report the outcome, exiting with status 1 on failure.
pub async fn run_build(config: &StampConfig, quiet: bool) -> Result<()> {
    match build_assets(config, quiet).await {
        Ok(report) => {
            log!(
                "done";
                "build complete: {}, {} rewritten, manifest of {} at {}",
                plural_count(report.assets, "asset"),
                plural_count(report.source_maps, "source map"),
                plural_count(report.manifest.len(), "source"),
                report.manifest_path.display()
            );
            Ok(())
        }
        Err(e) => {
            log!("error"; "build failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run every phase of the pipeline.
///
/// The returned error carries the phase that failed as context.
pub async fn build_assets(config: &StampConfig, quiet: bool) -> Result<BuildReport> {
    let pipeline = Pipeline::new(config, quiet);

    match pipeline.run().await {
        Ok(report) => {
            pipeline.enter(Phase::Done);
            Ok(report)
        }
        Err(e) => {
            let failed_in = pipeline.phase();
            pipeline.enter(Phase::Failed);
            Err(e.context(format!("while {failed_in}")))
        }
    }
}

struct Pipeline<'a> {
    config: &'a StampConfig,
    quiet: bool,
    phase: Cell<Phase>,
}

impl<'a> Pipeline<'a> {
    fn new(config: &'a StampConfig, quiet: bool) -> Self {
        Self {
            config,
            quiet,
            phase: Cell::new(Phase::Init),
        }
    }

    fn phase(&self) -> Phase {
        self.phase.get()
    }

    fn enter(&self, phase: Phase) {
        debug!("build"; "{} -> {}", self.phase.get(), phase);
        self.phase.set(phase);
    }

    async fn run(&self) -> Result<BuildReport> {
        let build = &self.config.build;

        let output_dir = self.config.output_dir();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;
        let manifest = load_manifest(&build.manifest)?;

        let locator = SourceLocator::new(build.roots.clone());
        let limit = JobLimit::new(build.jobs);

        self.enter(Phase::Resolving);
        let resolved = self.resolve(&manifest, &locator, &limit).await?;

        self.enter(Phase::Flattening);
        let pairs = self.flatten(&resolved)?;
        let copies = unique_destinations(&pairs);

        self.enter(Phase::Copying);
        let outcomes = self.copy_all(&copies, &locator, &limit).await?;

        self.enter(Phase::Manifesting);
        let final_manifest = self.final_manifest(&pairs);
        let manifest_path = self.write_manifest(&final_manifest).await?;

        Ok(BuildReport {
            manifest_path,
            manifest: final_manifest,
            assets: copies.len(),
            source_maps: outcomes.iter().map(|o| o.maps_rewritten).sum(),
        })
    }

    /// Create progress display if not quiet
    fn create_progress(&self, name: &'static str, total: usize) -> Option<ProgressLine> {
        (!self.quiet).then(|| ProgressLine::new(&[(name, total)]))
    }

    async fn resolve(
        &self,
        manifest: &ManifestNode,
        locator: &SourceLocator,
        limit: &JobLimit,
    ) -> Result<ResolvedNode> {
        let progress = self.create_progress("hash", manifest.path_count());
        let resolved = HashResolver::new(locator, limit, self.config.build.hash_length)
            .with_progress(progress.as_ref())
            .resolve(manifest)
            .await?;

        if let Some(p) = progress {
            p.finish();
        }
        Ok(resolved)
    }

    /// Flatten under the output prefix, rejecting destinations that escape it.
    fn flatten(&self, resolved: &ResolvedNode) -> Result<Vec<CopyPair>, AssetError> {
        let prefix = self.config.output_prefix();
        let pairs = flatten(resolved, &prefix);
        for pair in &pairs {
            pair.ensure_contained(&prefix)?;
        }
        debug!("build"; "{} planned", plural_count(pairs.len(), "copy pair"));
        Ok(pairs)
    }

    async fn copy_all(
        &self,
        copies: &[&CopyPair],
        locator: &SourceLocator,
        limit: &JobLimit,
    ) -> Result<Vec<CopyOutcome>> {
        let progress = self.create_progress("copy", copies.len());
        let rewriter = SourceMapRewriter::new(self.config.build.hash_length)
            .within(self.config.output_dir());
        let (rewriter, progress_ref) = (&rewriter, progress.as_ref());

        let outcomes = join_all_first_error(copies.iter().map(move |pair| async move {
            let outcome = self.copy_pair(pair, rewriter, locator, limit).await?;
            if let Some(p) = progress_ref {
                p.inc("copy");
            }
            Ok::<_, anyhow::Error>(outcome)
        }))
        .await?;

        if let Some(p) = progress {
            p.finish();
        }
        Ok(outcomes)
    }

    async fn copy_pair(
        &self,
        pair: &CopyPair,
        rewriter: &SourceMapRewriter,
        locator: &SourceLocator,
        limit: &JobLimit,
    ) -> Result<CopyOutcome> {
        let source = locator.locate(&pair.source).await;
        let dest = self.config.destination_path(&pair.destination);

        let outcome = limit
            .run(async {
                if let Some(parent) = dest.parent() {
                    tokio::fs::create_dir_all(parent).await.at(parent)?;
                }
                Ok::<_, AssetError>(rewriter.copy(&source, &dest).await?)
            })
            .await
            .with_context(|| format!("failed to copy `{}` to `{}`", pair.source, pair.destination))?;

        debug!(
            "copy";
            "{} -> {} ({}, {} rewritten)",
            pair.source,
            pair.destination,
            plural_count(outcome.lines, "line"),
            plural_count(outcome.maps_rewritten, "map")
        );
        Ok(outcome)
    }

    /// Reduce pairs into `source -> destination`, in flatten order.
    fn final_manifest(&self, pairs: &[CopyPair]) -> FinalManifest {
        let prefix = self.config.output_prefix();
        let mut manifest = FinalManifest::new();

        for pair in pairs {
            let value = if self.config.build.relative_paths {
                pair.relative_destination(&prefix).to_string()
            } else {
                pair.destination.clone()
            };

            if let Some(previous) = manifest.insert(pair.source.clone(), value)
                && previous != manifest[&pair.source]
            {
                log!(
                    "warning";
                    "`{}` is listed in several groups, manifest keeps `{}` over `{}`",
                    pair.source, manifest[&pair.source], previous
                );
            }
        }
        manifest
    }

    async fn write_manifest(&self, manifest: &FinalManifest) -> Result<PathBuf> {
        let path = self.config.manifest_output_path();
        let json = if self.config.build.pretty {
            serde_json::to_string_pretty(manifest)
        } else {
            serde_json::to_string(manifest)
        }
        .context("failed to serialize manifest")?;

        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write manifest {}", path.display()))?;
        Ok(path)
    }
}

/// Keep the first pair for each destination; later sources share its file.
fn unique_destinations(pairs: &[CopyPair]) -> Vec<&CopyPair> {
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    let mut unique = Vec::with_capacity(pairs.len());

    for pair in pairs {
        match owners.get(pair.destination.as_str()) {
            None => {
                owners.insert(&pair.destination, &pair.source);
                unique.push(pair);
            }
            Some(owner) if *owner != pair.source => {
                log!(
                    "warning";
                    "`{}` and `{}` both map to `{}`, writing it once",
                    owner, pair.source, pair.destination
                );
            }
            Some(_) => {}
        }
    }
    unique
}

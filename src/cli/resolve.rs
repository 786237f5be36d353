//! Resolve command implementation.
//!
//! Hashes every manifest path and prints the resolved tree as JSON, without
//! touching the output directory.

use anyhow::{Context, Result};

use crate::cli::args::ResolveArgs;
use crate::config::StampConfig;
use crate::manifest::{HashResolver, ResolvedNode, SourceLocator, load_manifest};
use crate::utils::task::JobLimit;

/// Run resolve command
pub async fn run_resolve(args: &ResolveArgs, config: &StampConfig) -> Result<()> {
    let resolved = resolve_manifest(config).await?;
    println!("{}", format_resolved(&resolved, args.pretty)?);
    Ok(())
}

/// Load and resolve the configured manifest.
pub async fn resolve_manifest(config: &StampConfig) -> Result<ResolvedNode> {
    let build = &config.build;
    let manifest = load_manifest(&build.manifest)?;

    let locator = SourceLocator::new(build.roots.clone());
    let limit = JobLimit::new(build.jobs);
    let resolved = HashResolver::new(&locator, &limit, build.hash_length)
        .resolve(&manifest)
        .await
        .context("failed to resolve manifest")?;
    Ok(resolved)
}

fn format_resolved(resolved: &ResolvedNode, pretty: bool) -> Result<String> {
    let formatted = if pretty {
        serde_json::to_string_pretty(resolved)?
    } else {
        serde_json::to_string(resolved)?
    };
    Ok(formatted)
}

//! Pipeline configuration management for `stamp.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── build      # [build] section
//! ├── error      # ConfigError
//! ├── util       # config lookup, path normalization
//! └── mod.rs     # StampConfig (this file)
//! ```
//!
//! The config file is optional: when the default `stamp.toml` cannot be
//! found, defaults are used with the current directory as project root.
//! CLI flags override file values.

mod build;
mod error;
mod util;

pub use build::BuildSectionConfig;
pub use error::ConfigError;

use util::{find_config_file, normalize_path};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the current directory.
pub const DEFAULT_CONFIG: &str = "stamp.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing stamp.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Absolute path to the config file; empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file, or cwd
    #[serde(skip)]
    pub root: PathBuf,

    /// Build settings
    pub build: BuildSectionConfig,
}

impl StampConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_in(cli, &cwd)
    }

    fn load_in(cli: &Cli, cwd: &Path) -> Result<Self> {
        let mut config = match find_config_file(&cli.config, cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None if cli.config == Path::new(DEFAULT_CONFIG) => {
                debug!("config"; "no {} found, using defaults", DEFAULT_CONFIG);
                Self::default()
            }
            None => return Err(ConfigError::NotFound(cli.config.clone()).into()),
        };

        let root = config
            .config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);

        config.apply_command_options(cli);
        config.finalize(&root);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "ignoring unknown fields in {}: {}", display_path, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Resolve relative paths against `root`.
    ///
    /// `build.output` stays as written: it is the prefix of every destination
    /// recorded in the final manifest. Use [`Self::output_dir`] for disk access.
    pub fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        self.build.manifest = normalize_path(&self.build.manifest, root);
        self.build.roots = self
            .build
            .roots
            .iter()
            .map(|p| normalize_path(p, root))
            .collect();
    }

    /// Validate configuration, collecting every error at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        self.build.validate(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors).into())
        }
    }

    // ========================================================================
    // paths
    // ========================================================================

    /// Destination root on disk.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }

    /// Destination prefix as written into the final manifest.
    pub fn output_prefix(&self) -> String {
        self.build.output.to_string_lossy().replace('\\', "/")
    }

    /// Final manifest location on disk.
    pub fn manifest_output_path(&self) -> PathBuf {
        self.output_dir().join(&self.build.manifest_name)
    }

    /// Disk location of a destination produced by flattening.
    pub fn destination_path(&self, destination: &str) -> PathBuf {
        self.root.join(destination)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { args } => {
                self.apply_source_args(&args.source);
                Self::update_option(&mut self.build.output, args.output.as_ref());
                Self::update_option(&mut self.build.jobs, args.jobs.as_ref());
                Self::update_option(&mut self.build.pretty, args.pretty.as_ref());
            }
            Commands::Resolve { args } => self.apply_source_args(&args.source),
        }
    }

    fn apply_source_args(&mut self, args: &SourceArgs) {
        Self::update_option(&mut self.build.manifest, args.manifest.as_ref());
        if !args.roots.is_empty() {
            self.build.roots = args.roots.clone();
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> StampConfig {
    let (parsed, ignored) = StampConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Default config rooted at `root`, ready for a pipeline run.
#[cfg(test)]
pub fn test_config(root: &Path) -> StampConfig {
    let mut config = StampConfig::default();
    config.finalize(root);
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("stamp").chain(args.iter().copied()))
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(StampConfig::parse_with_ignored("[build\noutput = \"dist\"").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\noutput = \"out\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = StampConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.build.output, PathBuf::from("out"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_load_without_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = StampConfig::load_in(&cli(&["build"]), dir.path()).unwrap();

        assert_eq!(config.root, dir.path());
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.output_dir(), dir.path().join("dist"));
        assert_eq!(config.build.manifest, dir.path().join("manifest.json"));
        assert_eq!(config.build.roots, vec![normalize_path(Path::new("."), dir.path())]);
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let err = StampConfig::load_in(&cli(&["-C", "custom.toml", "build"]), dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("custom.toml"));
    }

    #[test]
    fn test_load_finds_config_upward_and_applies_cli() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("web/src");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG),
            "[build]\noutput = \"public\"\njobs = 2\nmanifest = \"assets.toml\"",
        )
        .unwrap();

        let config =
            StampConfig::load_in(&cli(&["build", "--jobs", "8", "--pretty"]), &nested).unwrap();

        assert_eq!(config.root, dir.path());
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.jobs, 8);
        assert!(config.build.pretty);
        assert_eq!(config.build.manifest, dir.path().join("assets.toml"));
        assert_eq!(config.manifest_output_path(), dir.path().join("public/manifest.json"));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG), "[build]\nhash_length = 2").unwrap();

        let err = StampConfig::load_in(&cli(&["build"]), dir.path()).unwrap_err();
        assert!(err.to_string().contains("hash_length"));
    }

    #[test]
    fn test_output_prefix_and_destination() {
        let config = test_config(Path::new("/site"));
        assert_eq!(config.output_prefix(), "dist");
        assert_eq!(
            config.destination_path("dist/js/app.h1.js"),
            PathBuf::from("/site/dist/js/app.h1.js")
        );
    }
}

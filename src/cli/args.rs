//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Stamp - content-hashed static asset pipeline
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: stamp.toml)
    #[arg(short = 'C', long, global = true, default_value = "stamp.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Hash, copy and index every asset listed in the manifest
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Print the resolved manifest tree without writing anything
    #[command(visible_alias = "r")]
    Resolve {
        #[command(flatten)]
        args: ResolveArgs,
    },
}

/// Where to read the manifest and its sources from.
#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Manifest file (JSON or TOML, relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    /// Directories searched for manifest paths, in order (repeatable)
    #[arg(short, long = "root", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub roots: Vec<PathBuf>,
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Maximum number of files read or written at once
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Pretty-print the final manifest
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub pretty: Option<bool>,

    /// Hide the progress line
    #[arg(short, long)]
    pub quiet: bool,
}

/// Resolve command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stamp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_build_defaults() {
        let cli = parse(&["build"]);
        assert_eq!(cli.config, PathBuf::from("stamp.toml"));
        assert!(!cli.verbose);

        let Commands::Build { args } = cli.command else {
            panic!("expected build command");
        };
        assert!(args.source.manifest.is_none());
        assert!(args.source.roots.is_empty());
        assert!(args.output.is_none());
        assert!(args.pretty.is_none());
        assert!(!args.quiet);
    }

    #[test]
    fn test_build_flags() {
        let cli = parse(&[
            "-v", "build", "-m", "assets.json", "-o", "public", "-j", "4", "-p", "-r", "src",
            "-r", "vendor",
        ]);
        assert!(cli.verbose);

        let Commands::Build { args } = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.source.manifest, Some(PathBuf::from("assets.json")));
        assert_eq!(args.output, Some(PathBuf::from("public")));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.pretty, Some(true));
        assert_eq!(
            args.source.roots,
            vec![PathBuf::from("src"), PathBuf::from("vendor")]
        );
    }

    #[test]
    fn test_pretty_accepts_explicit_value() {
        let Commands::Build { args } = parse(&["build", "--pretty", "false"]).command else {
            panic!("expected build command");
        };
        assert_eq!(args.pretty, Some(false));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["resolve", "--pretty", "-C", "site.toml", "--verbose"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Resolve { args } if args.pretty));
    }

    #[test]
    fn test_jobs_must_be_number() {
        let result = Cli::try_parse_from(["stamp", "build", "-j", "many"]);
        assert!(result.is_err());
    }
}

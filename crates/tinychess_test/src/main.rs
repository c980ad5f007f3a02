//! TinyChessTest CLI
//!
//! Sets up and runs SPRT tournaments between two TinyChess revisions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tinychess_test::telemetry::init_tracing;
use tinychess_test::{BuildConfig, HarnessConfig, Pipeline, RevisionRef, SprtRequest};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "tinychess-test")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tournament setup for Elo testing the TinyChess engine", long_about = None)]
struct Cli {
    /// Log pipeline details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, build and SPRT-test two revisions
    Sprt(SprtArgs),

    /// Label a raw position export with game results
    Annotate {
        /// Raw export (`<name>.unfixed.fens`)
        unfixed: PathBuf,

        /// Keep the raw export after annotating
        #[arg(long)]
        keep: bool,
    },
}

#[derive(clap::Args)]
struct SprtArgs {
    /// TinyChess commit for engine 1. Passed to `git checkout`, so it can be
    /// a commit hash, branch or tag.
    #[arg(long = "engine-1-commit", visible_alias = "e1c", value_name = "COMMIT")]
    engine_1_commit: String,

    /// TinyChess commit for engine 2.
    #[arg(long = "engine-2-commit", visible_alias = "e2c", value_name = "COMMIT")]
    engine_2_commit: String,

    /// CMake build type (debug, release, relwithdebinfo, minsizerel)
    #[arg(long, default_value = "debug", value_parser = parse_build_config)]
    build_type: BuildConfig,

    /// Time control in cutechess-cli syntax
    #[arg(long = "tc", default_value = "10+0.1")]
    time_control: String,

    /// Maximum number of games
    #[arg(long, default_value_t = 1000)]
    games: u32,

    /// Games played in parallel
    #[arg(long, default_value_t = 1)]
    concurrency: u32,

    /// Disable the opening book
    #[arg(long)]
    no_book: bool,

    /// Opening suite (PGN) to stage for this run
    #[arg(long, value_name = "PGN", conflicts_with = "no_book")]
    book: Option<PathBuf>,

    /// Export annotated end positions to this file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Reuse cached sources and builds
    #[arg(long)]
    cache: bool,

    /// Harness configuration (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Working space root (overrides the configuration file)
    #[arg(long, value_name = "DIR")]
    working_dir: Option<PathBuf>,
}

fn parse_build_config(s: &str) -> Result<BuildConfig, String> {
    s.parse().map_err(|e: tinychess_test::Error| e.to_string())
}

fn run_sprt(args: SprtArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(dir) = args.working_dir {
        config.working_root = dir;
    }

    let engine_a = RevisionRef::new(&args.engine_1_commit).context("engine 1 commit")?;
    let engine_b = RevisionRef::new(&args.engine_2_commit).context("engine 2 commit")?;

    let request = SprtRequest {
        build_config: args.build_type,
        allow_cache: args.cache,
        time_control: args.time_control,
        games: args.games,
        concurrency: args.concurrency,
        no_book: args.no_book,
        opening_suite: args.book,
        export: args.export,
        ..SprtRequest::new(engine_a, engine_b)
    };

    let manifest = Pipeline::new(config).run(&request)?;
    println!("{}", manifest.generate_report());
    Ok(())
}

fn run_annotate(unfixed: PathBuf, keep: bool) -> Result<()> {
    let fixed = result_annotator::annotate(&unfixed)
        .with_context(|| format!("annotating {}", unfixed.display()))?;
    if !keep {
        std::fs::remove_file(&unfixed)
            .with_context(|| format!("removing {}", unfixed.display()))?;
    }
    info!(path = %fixed.display(), "annotated positions written");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { Level::DEBUG } else { Level::INFO });

    match cli.command {
        Commands::Sprt(args) => run_sprt(args),
        Commands::Annotate { unfixed, keep } => run_annotate(unfixed, keep),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sprt_aliases_and_defaults() {
        let cli = Cli::try_parse_from(["tinychess-test", "sprt", "--e1c", "v1", "--e2c", "main"])
            .unwrap();
        let Commands::Sprt(args) = cli.command else {
            panic!("expected sprt subcommand");
        };
        assert_eq!(args.engine_1_commit, "v1");
        assert_eq!(args.engine_2_commit, "main");
        assert_eq!(args.build_type, BuildConfig::Debug);
        assert_eq!(args.games, 1000);
        assert_eq!(args.concurrency, 1);
        assert!(!args.no_book && !args.cache);
    }

    #[test]
    fn test_build_type_is_parsed() {
        let cli = Cli::try_parse_from([
            "tinychess-test",
            "sprt",
            "--e1c",
            "a",
            "--e2c",
            "b",
            "--build-type",
            "Release",
        ])
        .unwrap();
        let Commands::Sprt(args) = cli.command else {
            panic!("expected sprt subcommand");
        };
        assert_eq!(args.build_type, BuildConfig::Release);
    }

    #[test]
    fn test_book_conflicts_with_no_book() {
        let result = Cli::try_parse_from([
            "tinychess-test",
            "sprt",
            "--e1c",
            "a",
            "--e2c",
            "b",
            "--no-book",
            "--book",
            "suite.pgn",
        ]);
        assert!(result.is_err());
    }
}

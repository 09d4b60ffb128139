//! Prism CLI: inspection and maintenance of the dimension build cache.
//!
//! The build itself runs through the engine embedded in a tool-exec
//! wrapper; this binary derives the keys the engine would use and looks at
//! or trims what it stored.

#![warn(missing_docs)]

mod cache;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use prism_config::{load_settings, Settings};

/// Prism dimension build cache tool.
#[derive(Parser, Debug)]
#[command(name = "prism", version, about = "Prism dimension build cache tool")]
pub struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Build cache directory, overriding configuration and environment.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Path to a `prism.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the action id and cache keys of a dimension build.
    ActionId(KeyArgs),
    /// Inspect or maintain the build cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show the cached artifact and metadata of a dimension build.
    Lookup(KeyArgs),
    /// Delete entries unused for five days, regardless of the last trim.
    Trim,
}

/// Identifies one dimension build.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct KeyArgs {
    /// Unit fingerprint, or a full `-buildid` value.
    #[arg(long)]
    pub fingerprint: String,

    /// Dimension name.
    #[arg(long)]
    pub dimension: String,

    /// Engine version.
    #[arg(long)]
    pub version: String,
}

/// Options shared by every command.
pub struct GlobalArgs {
    /// Debug-level logging.
    pub verbose: bool,
    /// Effective engine settings.
    pub settings: Settings,
}

fn main() {
    let cli = Cli::parse();

    let result = global_args(&cli).and_then(|global| {
        prism_engine::logging::init(global.verbose);
        match cli.command {
            Command::ActionId(ref args) => cache::action_id(args),
            Command::Cache(CacheCommand::Lookup(ref args)) => cache::lookup(args, &global),
            Command::Cache(CacheCommand::Trim) => cache::trim(&global),
        }
    });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Settings from `--config`, then `PRISM_*` variables, then flags.
fn global_args(cli: &Cli) -> Result<GlobalArgs, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    settings.apply_env(|name| std::env::var(name).ok())?;
    if let Some(dir) = &cli.cache_dir {
        settings.cache_dir = Some(dir.clone());
    }
    settings.verbose |= cli.verbose;
    Ok(GlobalArgs {
        verbose: settings.verbose,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_action_id() {
        let cli = Cli::parse_from([
            "prism",
            "action-id",
            "--fingerprint",
            "abc",
            "--dimension",
            "trace",
            "--version",
            "v1",
        ]);
        match cli.command {
            Command::ActionId(args) => {
                assert_eq!(args.fingerprint, "abc");
                assert_eq!(args.dimension, "trace");
                assert_eq!(args.version, "v1");
            }
            _ => panic!("expected ActionId command"),
        }
    }

    #[test]
    fn parse_cache_lookup_with_globals() {
        let cli = Cli::parse_from([
            "prism",
            "cache",
            "lookup",
            "--fingerprint",
            "abc/def",
            "--dimension",
            "trace",
            "--version",
            "v1",
            "--cache-dir",
            "/tmp/c",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
        assert!(matches!(cli.command, Command::Cache(CacheCommand::Lookup(_))));
    }

    #[test]
    fn parse_cache_trim() {
        let cli = Cli::parse_from(["prism", "--verbose", "cache", "trim"]);
        assert!(cli.verbose);
        assert!(cli.cache_dir.is_none());
        assert!(matches!(cli.command, Command::Cache(CacheCommand::Trim)));
    }

    #[test]
    fn missing_key_argument_is_rejected() {
        let err = Cli::try_parse_from(["prism", "action-id", "--fingerprint", "abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn cache_dir_flag_overrides() {
        let cli = Cli::parse_from(["prism", "--cache-dir", "/tmp/flag", "cache", "trim"]);
        let global = global_args(&cli).unwrap();
        assert_eq!(global.settings.cache_dir, Some(PathBuf::from("/tmp/flag")));
    }
}

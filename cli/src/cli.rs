use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the dotfile synchronizer.
#[derive(Parser, Debug)]
#[command(
    name = "dotdex",
    about = "Synchronize dotfiles between your home directory and a repository",
    version
)]
pub struct Cli {
    /// Subcommand to run; without one the program does nothing
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Configuration file (default: $DOTDEX_CONFIG, then ./dotdex)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the home directory
    #[arg(long, global = true, value_name = "PATH")]
    pub home: Option<PathBuf>,

    /// Override the cache directory holding snapshots, clones and logs
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy changed files from the home directory into the repository
    Push(SyncOpts),
    /// Copy changed files from the repository into the home directory
    Pull(SyncOpts),
    /// Show which files differ between home and the repository
    Status,
    /// Print version information
    Version,
    /// Anything else is accepted and ignored
    #[command(external_subcommand)]
    Other(Vec<String>),
}

/// Options for the `push` and `pull` subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct SyncOpts {
    /// Resolve every conflict in favor of the side being copied from
    #[arg(short, long)]
    pub force: bool,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_push() {
        let cli = Cli::parse_from(["dotdex", "push"]);
        assert!(matches!(cli.command, Some(Command::Push(SyncOpts { force: false }))));
    }

    #[test]
    fn parse_pull_force() {
        let cli = Cli::parse_from(["dotdex", "pull", "--force"]);
        assert!(matches!(cli.command, Some(Command::Pull(SyncOpts { force: true }))));
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["dotdex", "-d", "push"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_global_after_subcommand() {
        let cli = Cli::parse_from(["dotdex", "pull", "--dry-run", "--config", "/tmp/dotdex"]);
        assert!(cli.global.dry_run);
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/dotdex")));
    }

    #[test]
    fn parse_home_and_cache_overrides() {
        let cli = Cli::parse_from([
            "dotdex",
            "--home",
            "/home/other",
            "--cache-dir",
            "/tmp/cache",
            "status",
        ]);
        assert_eq!(cli.global.home, Some(PathBuf::from("/home/other")));
        assert_eq!(cli.global.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert!(matches!(cli.command, Some(Command::Status)));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["dotdex", "-v", "status"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["dotdex", "version"]);
        assert!(matches!(cli.command, Some(Command::Version)));
    }

    #[test]
    fn missing_subcommand_parses_to_none() {
        let cli = Cli::try_parse_from(["dotdex"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn unknown_subcommand_is_captured() {
        let cli = Cli::try_parse_from(["dotdex", "sync", "now"]).unwrap();
        match cli.command {
            Some(Command::Other(args)) => assert_eq!(args, ["sync", "now"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn force_is_not_global() {
        assert!(Cli::try_parse_from(["dotdex", "--force", "push"]).is_err());
    }
}

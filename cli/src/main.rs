use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotdex_cli::cli::{Cli, Command};
use dotdex_cli::logging::{self, Logger};
use dotdex_cli::{commands, paths};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    match &args.command {
        Some(Command::Push(opts)) => {
            commands::push::run(&args.global, opts, &init_logging(&args, "push"))
        }
        Some(Command::Pull(opts)) => {
            commands::pull::run(&args.global, opts, &init_logging(&args, "pull"))
        }
        Some(Command::Status) => commands::status::run(&args.global, &init_logging(&args, "status")),
        Some(Command::Version) => {
            commands::version::run();
            Ok(())
        }
        // No subcommand, or one we do not know: nothing to do.
        None | Some(Command::Other(_)) => Ok(()),
    }
}

/// Install the subscriber and create the logger for this run.
///
/// The log file lives in the cache directory and is named after the command.
fn init_logging(args: &Cli, command: &str) -> Arc<Logger> {
    let log_path = paths::cache_dir(args.global.cache_dir.as_deref(), args.global.home.as_deref())
        .map(|dir| logging::log_file_path(&dir, command));
    logging::init_subscriber(args.verbose, log_path.as_deref());
    Arc::new(Logger::new(log_path))
}

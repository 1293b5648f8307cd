// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `reloadctl`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reloadctl",
    version,
    about = "Start, stop and supervise a server process, restarting it when files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Reloadctl.toml` in the project root. A missing default file
    /// is fine (built-in defaults apply); a missing explicit file is an error.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Project root; relative paths in the config are resolved against it.
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELOADCTL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the server (optionally watching files and restarting on change).
    Start(StartArgs),
    /// Stop the server recorded in the pid file.
    Stop,
    /// Stop the recorded server and start it again in the foreground.
    Restart(RestartArgs),
    /// Show whether the recorded server is running.
    Status,
}

#[derive(Debug, Clone, Default, Args)]
pub struct StartArgs {
    /// Ask the server launcher to run in daemon mode.
    #[arg(short = 'd', long)]
    pub daemonize: bool,

    /// Clear the runtime cache directory before starting.
    #[arg(short = 'c', long)]
    pub clear: bool,

    /// Watch file changes and restart the server automatically.
    #[arg(short = 'w', long)]
    pub watch: bool,

    /// Interval for file watching in seconds (clamped to 1-15).
    #[arg(short = 't', long, value_name = "SECONDS")]
    pub interval: Option<i64>,

    /// Path to the launcher executable (otherwise resolved on PATH).
    #[arg(short = 'e', long = "exec", value_name = "PATH")]
    pub executable: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RestartArgs {
    /// Clear the runtime cache directory before restarting.
    #[arg(short = 'c', long)]
    pub clear: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_flags_parse_with_short_names() {
        let args = CliArgs::try_parse_from(["reloadctl", "start", "-w", "-c", "-t", "7"])
            .expect("valid args");
        match args.command {
            Command::Start(start) => {
                assert!(start.watch);
                assert!(start.clear);
                assert!(!start.daemonize);
                assert_eq!(start.interval, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let args = CliArgs::try_parse_from(["reloadctl", "status", "--root", "/srv/app"])
            .expect("valid args");
        assert_eq!(args.root, Some(PathBuf::from("/srv/app")));
        assert!(matches!(args.command, Command::Status));
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "context-monitor",
    version,
    about = "Records task token usage and raises handover flags"
)]
pub struct Cli {
    /// TOML file with monitor settings.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the SQLite event log.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the ingestion endpoint.
    Serve(ServeArgs),
    /// Poll the usage streams and raise handover flags.
    Watch(WatchArgs),
}

#[derive(Debug, Args, Default)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    /// Override the configured port for this run only.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args, Default)]
pub struct WatchArgs {
    /// Seconds between polls.
    #[arg(long, value_name = "SECS")]
    pub interval: Option<f64>,

    /// Usage ratio in [0, 1] at which a handover is requested.
    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Rescan every stream from the beginning instead of resuming from
    /// stored checkpoints.
    #[arg(long)]
    pub no_checkpoint: bool,

    /// Run a single tick and exit.
    #[arg(long)]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_flags() {
        let cli = Cli::parse_from([
            "context-monitor",
            "--db",
            "/tmp/monitor.sqlite",
            "watch",
            "--interval",
            "2",
            "--threshold",
            "0.8",
            "--no-checkpoint",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/monitor.sqlite")));
        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.interval, Some(2.0));
                assert_eq!(args.threshold, Some(0.8));
                assert!(args.no_checkpoint);
                assert!(!args.once);
            }
            other => panic!("expected watch, got {:?}", other),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["context-monitor", "serve", "--port", "9000", "--db", "x.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert!(matches!(
            cli.command,
            Command::Serve(ServeArgs { port: Some(9000), .. })
        ));
    }
}

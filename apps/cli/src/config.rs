use std::fs;
use std::path::Path;

use monitor_app::{AppError, AppPaths, MonitorConfig, Result, default_data_dir};

use crate::args::{Cli, Command};

/// Settings after every layer has been applied: defaults, the optional TOML
/// file, the environment and finally command-line flags.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: MonitorConfig,
    pub paths: AppPaths,
}

pub fn resolve(cli: &Cli) -> Result<Resolved> {
    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => MonitorConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    apply_flags(&mut config, cli);

    let paths = match &config.db_path {
        Some(db_path) => AppPaths::for_db(db_path.clone()),
        None => AppPaths::new(default_data_dir()),
    };
    Ok(Resolved { config, paths })
}

pub fn load_file(path: &Path) -> Result<MonitorConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        AppError::InvalidConfig(format!("read config {}: {}", path.display(), err))
    })?;
    toml::from_str(&contents).map_err(|err| {
        AppError::InvalidConfig(format!("parse config {}: {}", path.display(), err))
    })
}

fn apply_flags(config: &mut MonitorConfig, cli: &Cli) {
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    match &cli.command {
        Command::Serve(args) => {
            if let Some(host) = &args.host {
                config.host = host.clone();
            }
            if let Some(port) = args.port {
                config.port = port;
            }
        }
        Command::Watch(args) => {
            if let Some(interval) = args.interval {
                config.poll_interval_secs = interval;
            }
            if let Some(threshold) = args.threshold {
                config.critical_threshold = threshold;
            }
            if let Some(batch_size) = args.batch_size {
                config.batch_size = batch_size;
            }
            if args.no_checkpoint {
                config.checkpoint = false;
            }
        }
    }
}

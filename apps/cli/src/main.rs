mod args;
mod config;

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use app_api::AppContext;
use http_api::HttpState;
use monitor_app::{AppState, MonitorConfig, ensure_app_data_dir};
use watcher::{Watcher, run_tick, run_until};

use crate::args::{Cli, Command};

const LOG_FORMAT_ENV: &str = "CONTEXT_MONITOR_LOG_FORMAT";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let resolved = config::resolve(&cli)?;
    let paths = &resolved.paths;
    ensure_app_data_dir(paths)?;
    tracing::info!(path = %paths.db_path.display(), "using event log");

    match cli.command {
        Command::Serve(_) => serve(&resolved.config, &paths.db_path).await,
        Command::Watch(args) => watch(&resolved.config, &paths.db_path, args.once).await,
    }
}

fn init_tracing() {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

async fn serve(config: &MonitorConfig, db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = AppState::new(db_path.to_path_buf());
    if app_state.is_fresh_db() {
        tracing::info!("creating new event log");
    }
    app_state
        .setup_db()
        .map_err(|err| io::Error::other(format!("failed to initialize database: {}", err)))?;

    let state = HttpState::new(AppContext { app_state });
    let router = http_api::router(state);

    let host: IpAddr = config
        .host
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host address"))?;
    let (listener, actual_port, used_fallback) = bind_port(host, config.port).await?;
    if used_fallback {
        eprintln!(
            "Configured port {} was unavailable; using {actual_port} for this run.",
            config.port
        );
    }

    println!("Context monitor is listening on http://{host}:{actual_port}");
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn watch(
    config: &MonitorConfig,
    db_path: &Path,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut watcher = Watcher::new(config.watcher_config()?);
    if once {
        if let Some(report) = run_tick(&mut watcher, db_path) {
            println!(
                "Scanned {} streams, processed {} entries, skipped {}, raised {} flags.",
                report.streams_scanned,
                report.entries_processed,
                report.entries_skipped,
                report.flags_raised.len()
            );
        }
        return Ok(());
    }
    run_until(watcher, db_path, shutdown_signal()).await;
    Ok(())
}

async fn bind_port(
    host: IpAddr,
    port: u16,
) -> Result<(tokio::net::TcpListener, u16, bool), io::Error> {
    if port == 0 {
        let listener = tokio::net::TcpListener::bind(SocketAddr::new(host, 0)).await?;
        let actual_port = listener.local_addr()?.port();
        return Ok((listener, actual_port, false));
    }

    match tokio::net::TcpListener::bind(SocketAddr::new(host, port)).await {
        Ok(listener) => Ok((listener, port, false)),
        Err(_) => {
            let listener = tokio::net::TcpListener::bind(SocketAddr::new(host, 0)).await?;
            let actual_port = listener.local_addr()?.port();
            Ok((listener, actual_port, true))
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

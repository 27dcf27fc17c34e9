use std::future::Future;
use std::path::Path;

use monitor_db::Db;
use tracing::{error, info};

use crate::pipeline::Watcher;
use crate::types::PollReport;

/// Opens the store and runs a single tick. Failures are logged and reported
/// as `None`; they never stop the caller's loop.
pub fn run_tick(watcher: &mut Watcher, db_path: &Path) -> Option<PollReport> {
    let mut db = match Db::open_migrated(db_path) {
        Ok(db) => db,
        Err(err) => {
            error!(path = %db_path.display(), error = %err, "failed to open store");
            return None;
        }
    };
    match watcher.poll_once(&mut db) {
        Ok(report) => {
            if !report.flags_raised.is_empty() || !report.issues.is_empty() {
                info!(
                    streams = report.streams_scanned,
                    processed = report.entries_processed,
                    skipped = report.entries_skipped,
                    flags = report.flags_raised.len(),
                    issues = report.issues.len(),
                    "poll tick finished"
                );
            }
            Some(report)
        }
        Err(err) => {
            error!(error = %err, "error while processing streams");
            None
        }
    }
}

/// Polls until `shutdown` resolves, sleeping the configured interval between
/// ticks. Returns the watcher so callers can inspect its final cursors.
pub async fn run_until<F>(mut watcher: Watcher, db_path: &Path, shutdown: F) -> Watcher
where
    F: Future<Output = ()>,
{
    info!(
        threshold_pct = watcher.config().critical_threshold * 100.0,
        interval_secs = watcher.config().poll_interval.as_secs_f64(),
        "context watcher started"
    );
    tokio::pin!(shutdown);
    loop {
        run_tick(&mut watcher, db_path);
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(watcher.config().poll_interval) => {}
        }
    }
    info!("context watcher stopped");
    watcher
}

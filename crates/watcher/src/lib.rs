mod parser;
mod pipeline;
mod runner;
mod types;

pub use parser::{UsageSample, parse_usage_sample};
pub use pipeline::Watcher;
pub use runner::{run_tick, run_until};
pub use types::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONSUMER, DEFAULT_CRITICAL_THRESHOLD, DEFAULT_POLL_INTERVAL,
    EntryError, PollReport, Result, WatchError, WatchIssue, WatcherConfig,
};

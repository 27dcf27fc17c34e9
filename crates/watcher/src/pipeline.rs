use std::collections::BTreeMap;

use monitor_core::{
    EntryId, HANDOVER_VALUE, STREAM_PREFIX, StreamEntry, exceeds_threshold, handover_key,
};
use monitor_db::EventLog;
use tracing::{debug, error, info, warn};

use crate::parser::{UsageSample, parse_usage_sample};
use crate::types::{EntryError, PollReport, Result, WatchIssue, WatcherConfig};

/// Polling consumer of the per-project usage streams.
///
/// Owns the cursor map; a single loop drives it through `poll_once`, so the
/// cursors are never mutated concurrently.
#[derive(Debug)]
pub struct Watcher {
    config: WatcherConfig,
    cursors: BTreeMap<String, EntryId>,
    checkpoints_loaded: bool,
}

impl Watcher {
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            config,
            cursors: BTreeMap::new(),
            checkpoints_loaded: false,
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub fn cursor(&self, stream_key: &str) -> Option<EntryId> {
        self.cursors.get(stream_key).copied()
    }

    pub fn cursors(&self) -> &BTreeMap<String, EntryId> {
        &self.cursors
    }

    /// Seeds cursors from the persisted checkpoints of this consumer.
    pub fn restore_checkpoints<L: EventLog + ?Sized>(&mut self, log: &L) -> Result<usize> {
        let checkpoints = log.load_checkpoints(&self.config.consumer)?;
        let restored = checkpoints.len();
        for (stream_key, id) in checkpoints {
            self.advance_cursor(&stream_key, id);
        }
        self.checkpoints_loaded = true;
        if restored > 0 {
            info!(
                consumer = %self.config.consumer,
                streams = restored,
                "restored stream checkpoints"
            );
        }
        Ok(restored)
    }

    /// Runs one tick over every usage stream. Only a failure to enumerate the
    /// streams (or to load checkpoints) is returned; per-stream and per-entry
    /// problems are logged and collected in the report.
    pub fn poll_once<L: EventLog + ?Sized>(&mut self, log: &mut L) -> Result<PollReport> {
        if self.config.checkpoint && !self.checkpoints_loaded {
            self.restore_checkpoints(log)?;
        }

        let mut report = PollReport::default();
        let stream_keys = log.keys_with_prefix(STREAM_PREFIX)?;
        for stream_key in stream_keys {
            report.streams_scanned += 1;
            self.process_stream(log, &stream_key, &mut report);
        }
        Ok(report)
    }

    fn process_stream<L: EventLog + ?Sized>(
        &mut self,
        log: &mut L,
        stream_key: &str,
        report: &mut PollReport,
    ) {
        let after = self.cursor(stream_key).unwrap_or(EntryId::ZERO);
        let entries = match log.read_after(stream_key, after, self.config.batch_size) {
            Ok(entries) => entries,
            Err(err) => {
                error!(stream = stream_key, error = %err, "failed to read stream");
                report.issues.push(WatchIssue {
                    stream_key: stream_key.to_string(),
                    entry_id: None,
                    message: err.to_string(),
                });
                return;
            }
        };
        if entries.is_empty() {
            return;
        }
        debug!(stream = stream_key, count = entries.len(), %after, "read stream batch");

        for entry in &entries {
            self.process_entry(log, stream_key, entry, report);
            self.advance_cursor(stream_key, entry.id);
        }

        if self.config.checkpoint
            && let Some(cursor) = self.cursor(stream_key)
            && let Err(err) = log.save_checkpoint(&self.config.consumer, stream_key, cursor)
        {
            error!(stream = stream_key, error = %err, "failed to save checkpoint");
            report.issues.push(WatchIssue {
                stream_key: stream_key.to_string(),
                entry_id: Some(cursor),
                message: format!("checkpoint: {}", err),
            });
        }
    }

    fn process_entry<L: EventLog + ?Sized>(
        &self,
        log: &mut L,
        stream_key: &str,
        entry: &StreamEntry,
        report: &mut PollReport,
    ) {
        let sample = match parse_usage_sample(entry) {
            Ok(sample) => sample,
            Err(err) => {
                match err {
                    EntryError::MissingTaskId => {
                        warn!(stream = stream_key, entry = %entry.id, "entry missing task_id, skipping")
                    }
                    _ => {
                        error!(stream = stream_key, entry = %entry.id, error = %err, "error parsing entry")
                    }
                }
                report.entries_skipped += 1;
                report.issues.push(WatchIssue {
                    stream_key: stream_key.to_string(),
                    entry_id: Some(entry.id),
                    message: err.to_string(),
                });
                return;
            }
        };
        report.entries_processed += 1;

        if !exceeds_threshold(sample.ratio, self.config.critical_threshold) {
            return;
        }
        self.raise_handover(log, stream_key, entry.id, &sample, report);
    }

    fn raise_handover<L: EventLog + ?Sized>(
        &self,
        log: &mut L,
        stream_key: &str,
        entry_id: EntryId,
        sample: &UsageSample,
        report: &mut PollReport,
    ) {
        warn!(
            task_id = %sample.task_id,
            token_count = sample.token_count,
            max_tokens = sample.max_tokens,
            "critical token usage: {:.1}%",
            sample.ratio * 100.0
        );
        let key = handover_key(&sample.task_id);
        match log.set_flag(&key, HANDOVER_VALUE) {
            Ok(()) => {
                info!(flag = %key, "set handover flag");
                report.flags_raised.push(sample.task_id.clone());
            }
            Err(err) => {
                error!(flag = %key, error = %err, "failed to set handover flag");
                report.issues.push(WatchIssue {
                    stream_key: stream_key.to_string(),
                    entry_id: Some(entry_id),
                    message: err.to_string(),
                });
            }
        }
    }

    fn advance_cursor(&mut self, stream_key: &str, id: EntryId) {
        let cursor = self
            .cursors
            .entry(stream_key.to_string())
            .or_insert(EntryId::ZERO);
        if id > *cursor {
            *cursor = id;
        }
    }
}

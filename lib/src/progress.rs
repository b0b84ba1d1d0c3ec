// Copyright 2026 The odbcopy Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tiered progress reporting: logs every transaction when verbose or the
//! total is small, otherwise logs on an interval, and always logs a
//! final summary.

use std::time::{Duration, Instant};

/// Receives per-transaction notifications from the copy engine.
pub trait Progress {
    fn on_transaction(&mut self, tid_display: &str, record_count: usize, byte_size: u64, blob_count: usize);
    fn log_summary(&mut self, txn_count: usize, obj_count: usize, blob_count: usize);
}

/// Default reporter, built on the ambient `tracing` facade: tiering
/// controls which events are *emitted*, not where they go (the
/// subscriber installed by the CLI decides that).
pub struct ProgressReporter {
    total_txns: Option<usize>,
    verbose: bool,
    log_interval: Duration,
    log_count: usize,
    started_at: Instant,
    last_log_at: Instant,
    txns_since_log: usize,
    txns_seen: usize,
    bytes_seen: u64,
}

impl ProgressReporter {
    pub fn new(total_txns: Option<usize>, verbose: bool) -> Self {
        let now = Instant::now();
        Self {
            total_txns,
            verbose,
            log_interval: Duration::from_secs(10),
            log_count: 100,
            started_at: now,
            last_log_at: now,
            txns_since_log: 0,
            txns_seen: 0,
            bytes_seen: 0,
        }
    }

    #[cfg(test)]
    pub fn with_thresholds(total_txns: Option<usize>, verbose: bool, log_interval: Duration, log_count: usize) -> Self {
        let mut reporter = Self::new(total_txns, verbose);
        reporter.log_interval = log_interval;
        reporter.log_count = log_count;
        reporter
    }

    fn per_transaction(&self) -> bool {
        self.verbose || self.total_txns.is_some_and(|t| t < 100)
    }

    fn should_interval_log(&self) -> bool {
        self.txns_since_log >= self.log_count || self.last_log_at.elapsed() >= self.log_interval
    }
}

impl Progress for ProgressReporter {
    fn on_transaction(&mut self, tid_display: &str, record_count: usize, byte_size: u64, blob_count: usize) {
        self.txns_seen += 1;
        self.bytes_seen += byte_size;
        self.txns_since_log += 1;

        if self.per_transaction() {
            tracing::info!(
                tid = tid_display,
                records = record_count,
                bytes = byte_size,
                blobs = blob_count,
                "copied transaction"
            );
            self.txns_since_log = 0;
            self.last_log_at = Instant::now();
            return;
        }

        if self.txns_seen == 1 || self.should_interval_log() {
            tracing::info!(
                tid = tid_display,
                total_copied = self.txns_seen,
                total = ?self.total_txns,
                "copy progress"
            );
            self.txns_since_log = 0;
            self.last_log_at = Instant::now();
        } else {
            tracing::debug!(tid = tid_display, records = record_count, "copied transaction");
        }
    }

    fn log_summary(&mut self, txn_count: usize, obj_count: usize, blob_count: usize) {
        let elapsed = self.started_at.elapsed();
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        tracing::info!(
            txn_count,
            obj_count,
            blob_count,
            bytes = self.bytes_seen,
            elapsed_secs = secs,
            txns_per_sec = txn_count as f64 / secs,
            bytes_per_sec = self.bytes_seen as f64 / secs,
            "copy complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_transaction_true_when_verbose() {
        let reporter = ProgressReporter::new(Some(10_000), true);
        assert!(reporter.per_transaction());
    }

    #[test]
    fn per_transaction_true_when_total_small() {
        let reporter = ProgressReporter::new(Some(5), false);
        assert!(reporter.per_transaction());
    }

    #[test]
    fn per_transaction_false_when_total_large_and_quiet() {
        let reporter = ProgressReporter::new(Some(10_000), false);
        assert!(!reporter.per_transaction());
    }

    #[test]
    fn interval_log_triggers_after_count_threshold() {
        let mut reporter =
            ProgressReporter::with_thresholds(Some(10_000), false, Duration::from_secs(3600), 3);
        for n in 0..3 {
            reporter.on_transaction(&n.to_string(), 1, 10, 0);
        }
        assert!(reporter.should_interval_log() || reporter.txns_since_log == 0);
    }
}

/*!
 * Processing state tracking.
 *
 * The tracker is the single source of truth for whether a segment's text
 * has already been handled during the current page session. It is keyed by
 * segment fingerprint and shared between concurrent segment tasks.
 */

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Diagnostics recorded when a fingerprint reaches a final state
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    pub dom_path: String,
    pub replacement_count: usize,
    pub success: bool,
    pub finished_at: DateTime<Utc>,
}

/// Lifecycle of a fingerprint.
///
/// `Unprocessed -> Processing -> Completed | Failed`. `Failed` may be claimed
/// again; `Completed` is terminal for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingStatus {
    Unprocessed,
    Processing,
    Completed(ProcessedRecord),
    Failed { dom_path: String },
}

/// Fingerprint → status map with an atomic claim operation
#[derive(Debug, Default)]
pub struct ProcessingStateTracker {
    entries: Mutex<HashMap<String, ProcessingStatus>>,
}

impl ProcessingStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status, `Unprocessed` for unknown fingerprints
    pub fn status(&self, fingerprint: &str) -> ProcessingStatus {
        self.entries
            .lock()
            .get(fingerprint)
            .cloned()
            .unwrap_or(ProcessingStatus::Unprocessed)
    }

    pub fn is_processed(&self, fingerprint: &str) -> bool {
        matches!(self.entries.lock().get(fingerprint), Some(ProcessingStatus::Completed(_)))
    }

    pub fn is_processing(&self, fingerprint: &str) -> bool {
        matches!(self.entries.lock().get(fingerprint), Some(ProcessingStatus::Processing))
    }

    /// Completion record of a fingerprint, if it completed
    pub fn record(&self, fingerprint: &str) -> Option<ProcessedRecord> {
        match self.entries.lock().get(fingerprint) {
            Some(ProcessingStatus::Completed(record)) => Some(record.clone()),
            _ => None,
        }
    }

    /// Claim exclusive processing rights over a fingerprint.
    ///
    /// Check and set happen under one lock. Returns `false` without effect
    /// when the fingerprint is already processing or completed.
    pub fn claim_start(&self, fingerprint: &str) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(fingerprint) {
            Some(ProcessingStatus::Processing) | Some(ProcessingStatus::Completed(_)) => {
                debug!("Claim rejected for {}", fingerprint);
                false
            }
            _ => {
                entries.insert(fingerprint.to_string(), ProcessingStatus::Processing);
                true
            }
        }
    }

    /// `Processing -> Completed`. Returns `false` for any other starting state.
    pub fn mark_complete(&self, fingerprint: &str, dom_path: &str, replacement_count: usize, success: bool) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(fingerprint) {
            Some(status) if *status == ProcessingStatus::Processing => {
                *status = ProcessingStatus::Completed(ProcessedRecord {
                    dom_path: dom_path.to_string(),
                    replacement_count,
                    success,
                    finished_at: Utc::now(),
                });
                true
            }
            _ => false,
        }
    }

    /// `Processing -> Failed`. Returns `false` for any other starting state.
    pub fn mark_failed(&self, fingerprint: &str, dom_path: &str) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(fingerprint) {
            Some(status) if *status == ProcessingStatus::Processing => {
                *status = ProcessingStatus::Failed {
                    dom_path: dom_path.to_string(),
                };
                true
            }
            _ => false,
        }
    }

    /// Number of fingerprints seen this session
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forget every fingerprint (full page reset)
    pub fn reset(&self) {
        self.entries.lock().clear();
        debug!("Processing state cleared");
    }
}

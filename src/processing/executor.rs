/*!
 * Batch execution of admitted segments.
 *
 * Segments are processed in fixed-size batches: every segment of a batch
 * runs concurrently, and the next batch starts only once all of them have
 * settled. Each segment task is isolated. A translator error or a panic is
 * turned into a failed report for that segment and never reaches siblings.
 */

use chrono::Utc;
use futures::FutureExt;
use futures::future::join_all;
use log::{debug, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::document::{NodeId, TextBuffer};
use crate::errors::{SegmentError, panic_message};
use crate::providers::{PronunciationService, Translator};
use crate::segment::ContentSegment;

use super::markup::{DisplaySettings, FRESH_CLASS, PROCESSING_CLASS};
use super::range_mapper::{AppliedReplacement, mark_processed, write_segment};
use super::state::ProcessingStateTracker;

/// Translations that get pronunciation data
static ENGLISH_LOOKING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z '\-]*$").unwrap());

/// Default number of segments processed concurrently
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Successful result of one segment task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentOutcome {
    pub replacement_count: usize,
    pub relocated: usize,
    pub discarded: usize,
}

/// Per-segment entry of a processing result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentReport {
    pub fingerprint: String,
    pub dom_path: String,
    pub success: bool,
    pub replacement_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of all batches of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub reports: Vec<SegmentReport>,
    pub processed_count: usize,
    pub error_count: usize,
    pub total_replacements: usize,
}

impl BatchSummary {
    /// First per-segment error message, in report order
    pub fn first_error(&self) -> Option<&str> {
        self.reports.iter().find_map(|r| r.error.as_deref())
    }

    fn push(&mut self, report: SegmentReport) {
        if report.success {
            self.processed_count += 1;
            self.total_replacements += report.replacement_count;
        } else {
            self.error_count += 1;
        }
        self.reports.push(report);
    }
}

/// Everything a segment task needs, shared by all tasks of a run
pub struct ExecutionContext<D> {
    pub run_id: String,
    pub document: Arc<Mutex<D>>,
    pub translator: Arc<dyn Translator>,
    pub pronunciation: Option<Arc<dyn PronunciationService>>,
    pub tracker: Arc<ProcessingStateTracker>,
    pub settings: DisplaySettings,
    pub pulse_duration: Duration,
    /// In-flight segments per container element
    pub active_markers: Arc<Mutex<HashMap<NodeId, usize>>>,
}

impl<D> ExecutionContext<D> {
    pub fn new(
        run_id: impl Into<String>,
        document: Arc<Mutex<D>>,
        translator: Arc<dyn Translator>,
        tracker: Arc<ProcessingStateTracker>,
        settings: DisplaySettings,
        pulse_duration: Duration,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            document,
            translator,
            pronunciation: None,
            tracker,
            settings,
            pulse_duration,
            active_markers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_pronunciation(mut self, pronunciation: Option<Arc<dyn PronunciationService>>) -> Self {
        self.pronunciation = pronunciation;
        self
    }
}

/// Keeps the processing class on a segment's containers while alive.
///
/// Containers shared by several in-flight segments keep the class until the
/// last of them settles.
struct ProcessingMarker<D: TextBuffer> {
    document: Arc<Mutex<D>>,
    active: Arc<Mutex<HashMap<NodeId, usize>>>,
    elements: Vec<NodeId>,
}

impl<D: TextBuffer> ProcessingMarker<D> {
    fn attach(ctx: &ExecutionContext<D>, elements: &[NodeId]) -> Self {
        let mut elements = elements.to_vec();
        elements.sort_unstable();
        elements.dedup();

        {
            let mut active = ctx.active_markers.lock();
            let mut doc = ctx.document.lock();
            for element in &elements {
                let count = active.entry(*element).or_insert(0);
                *count += 1;
                if *count == 1 {
                    if let Err(e) = doc.add_class(*element, PROCESSING_CLASS) {
                        debug!("Could not mark {} as processing: {}", element, e);
                    }
                }
            }
        }
        Self {
            document: Arc::clone(&ctx.document),
            active: Arc::clone(&ctx.active_markers),
            elements,
        }
    }
}

impl<D: TextBuffer> Drop for ProcessingMarker<D> {
    fn drop(&mut self) {
        let mut active = self.active.lock();
        let mut doc = self.document.lock();
        for element in &self.elements {
            let remaining = match active.get_mut(element) {
                Some(count) => {
                    *count = count.saturating_sub(1);
                    *count
                }
                None => 0,
            };
            if remaining > 0 {
                continue;
            }
            active.remove(element);
            if let Err(e) = doc.remove_class(*element, PROCESSING_CLASS) {
                debug!("Could not clear processing mark on {}: {}", element, e);
            }
        }
    }
}

/// Runs admitted segments with bounded parallelism
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    batch_size: usize,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchExecutor {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Process `work` (segment, allocated count) batch by batch
    pub async fn run<D>(&self, ctx: &ExecutionContext<D>, work: &[(&ContentSegment, usize)]) -> BatchSummary
    where
        D: TextBuffer + Send + 'static,
    {
        let mut summary = BatchSummary::default();
        let total_batches = work.len().div_ceil(self.batch_size);

        for (batch_index, batch) in work.chunks(self.batch_size).enumerate() {
            debug!(
                "[{}] Batch {} of {} ({} segments)",
                ctx.run_id,
                batch_index + 1,
                total_batches,
                batch.len()
            );

            let tasks = batch
                .iter()
                .map(|(segment, target)| self.run_isolated(ctx, segment, *target));
            for report in join_all(tasks).await {
                summary.push(report);
            }
        }

        summary
    }

    /// Run one segment behind its fault boundary and settle its state
    async fn run_isolated<D>(&self, ctx: &ExecutionContext<D>, segment: &ContentSegment, target: usize) -> SegmentReport
    where
        D: TextBuffer + Send + 'static,
    {
        let result = AssertUnwindSafe(self.process_segment(ctx, segment, target))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(SegmentError::Panicked(panic_message(payload.as_ref()))));

        let fingerprint = segment.fingerprint().to_string();
        let dom_path = segment.dom_path().to_string();

        match result {
            Ok(outcome) => {
                ctx.tracker
                    .mark_complete(&fingerprint, &dom_path, outcome.replacement_count, true);
                debug!(
                    "[{}] {} done: {} applied, {} relocated, {} discarded",
                    ctx.run_id, dom_path, outcome.replacement_count, outcome.relocated, outcome.discarded
                );
                SegmentReport {
                    fingerprint,
                    dom_path,
                    success: true,
                    replacement_count: outcome.replacement_count,
                    error: None,
                }
            }
            Err(e) => {
                ctx.tracker.mark_failed(&fingerprint, &dom_path);
                warn!("[{}] Segment {} failed: {}", ctx.run_id, dom_path, e);
                SegmentReport {
                    fingerprint,
                    dom_path,
                    success: false,
                    replacement_count: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn process_segment<D>(
        &self,
        ctx: &ExecutionContext<D>,
        segment: &ContentSegment,
        target: usize,
    ) -> Result<SegmentOutcome, SegmentError>
    where
        D: TextBuffer + Send + 'static,
    {
        let _marker = ProcessingMarker::attach(ctx, segment.elements());

        let response = ctx
            .translator
            .translate(segment.text_content(), Some(target))
            .await?;

        if response.replacements.is_empty() {
            let mut doc = ctx.document.lock();
            mark_processed(&mut *doc, segment.text_nodes(), Utc::now().timestamp_millis());
            return Ok(SegmentOutcome::default());
        }

        let report = {
            let mut doc = ctx.document.lock();
            write_segment(&mut *doc, segment.text_nodes(), &response.replacements, &ctx.settings)
        };
        self.schedule_followups(ctx, &report.applied);

        Ok(SegmentOutcome {
            replacement_count: report.applied.len(),
            relocated: report.relocated,
            discarded: report.discarded,
        })
    }

    /// Spawn pulse removal and pronunciation lookups for written spans
    fn schedule_followups<D>(&self, ctx: &ExecutionContext<D>, applied: &[AppliedReplacement])
    where
        D: TextBuffer + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("[{}] No runtime available, skipping follow-up tasks", ctx.run_id);
            return;
        };

        for replacement in applied {
            let span = replacement.translation_span;

            let document = Arc::clone(&ctx.document);
            let pulse = ctx.pulse_duration;
            handle.spawn(async move {
                tokio::time::sleep(pulse).await;
                if let Err(e) = document.lock().remove_class(span, FRESH_CLASS) {
                    debug!("Could not clear pulse on {}: {}", span, e);
                }
            });

            if let Some(service) = &ctx.pronunciation {
                if ENGLISH_LOOKING.is_match(&replacement.translation) {
                    let service = Arc::clone(service);
                    let text = replacement.translation.clone();
                    handle.spawn(async move {
                        if let Err(e) = service.add_pronunciation(span, &text).await {
                            warn!("Pronunciation lookup failed for '{}': {}", text, e);
                        }
                    });
                }
            }
        }
    }
}

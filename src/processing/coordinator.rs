/*!
 * Processing coordinator.
 *
 * The coordinator is the entry point for turning captured content segments
 * into rewritten text. Every `process_segments` call:
 *
 * - waits for its turn in a FIFO queue so that calls never overlap,
 * - admits only segments that are neither processed nor in flight,
 * - plans a page-wide replacement budget across the admitted segments,
 * - runs them in bounded batches, isolating per-segment failures,
 * - updates cumulative statistics.
 *
 * A fault outside every per-segment boundary aborts the run; admitted
 * segments that were still in flight are moved to failed so that the next
 * call can proceed.
 */

use futures::FutureExt;
use log::{debug, error, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::app_config::Config;
use crate::document::TextBuffer;
use crate::errors::{CoordinatorError, panic_message};
use crate::providers::{PronunciationService, Translator};
use crate::segment::ContentSegment;

use super::allocation::{AllocationPlanner, RandomSource, RngSource};
use super::executor::{BatchExecutor, BatchSummary, ExecutionContext, SegmentReport};
use super::markup::DisplaySettings;
use super::state::ProcessingStateTracker;
use super::word_count::count_words;

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    pub display: DisplaySettings,
    /// Segments came from a scroll-triggered batch rather than the initial scan
    pub lazy_loading: bool,
}

/// Outcome of one `process_segments` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    /// False only when the run was aborted by a global fault
    pub success: bool,
    pub replacement_count: usize,
    /// Number of segments admitted for processing
    pub segment_count: usize,
    pub skipped_count: usize,
    pub processed_count: usize,
    pub error_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub outcomes: Vec<SegmentReport>,
}

/// Cumulative statistics since construction or the last reset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinatorStats {
    pub total_processed: u64,
    pub total_skipped: u64,
    pub total_errors: u64,
    /// Exponential moving average over runs
    pub average_processing_time_ms: f64,
    pub runs: u64,
}

/// Decrements the pending counter when a call leaves the queue
struct PendingSlot<'a>(&'a AtomicUsize);

impl<'a> PendingSlot<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serializes processing calls against one document
pub struct ProcessingCoordinator<D> {
    document: Arc<Mutex<D>>,
    translator: Arc<dyn Translator>,
    pronunciation: Option<Arc<dyn PronunciationService>>,
    pronunciation_enabled: bool,
    tracker: Arc<ProcessingStateTracker>,
    planner: AllocationPlanner,
    random: Mutex<Box<dyn RandomSource>>,
    executor: BatchExecutor,
    pulse_duration: Duration,
    stats_smoothing: f64,
    queue: tokio::sync::Mutex<()>,
    pending: AtomicUsize,
    stats: Mutex<CoordinatorStats>,
}

impl<D> ProcessingCoordinator<D>
where
    D: TextBuffer + Send + 'static,
{
    /// Create a coordinator over `document` using settings from `config`
    pub fn new(document: Arc<Mutex<D>>, translator: Arc<dyn Translator>, config: &Config) -> Self {
        Self {
            document,
            translator,
            pronunciation: None,
            pronunciation_enabled: config.pronunciation_enabled,
            tracker: Arc::new(ProcessingStateTracker::new()),
            planner: AllocationPlanner::new(config.replacement_rate),
            random: Mutex::new(Box::new(RngSource::from_os())),
            executor: BatchExecutor::new(config.batch_size),
            pulse_duration: Duration::from_millis(config.pulse_duration_ms),
            stats_smoothing: config.stats_smoothing.clamp(f64::EPSILON, 1.0),
            queue: tokio::sync::Mutex::new(()),
            pending: AtomicUsize::new(0),
            stats: Mutex::new(CoordinatorStats::default()),
        }
    }

    pub fn with_pronunciation(mut self, service: Arc<dyn PronunciationService>) -> Self {
        self.pronunciation = Some(service);
        self
    }

    /// Replace the random source used for stochastic rounding
    pub fn with_random_source(mut self, source: Box<dyn RandomSource>) -> Self {
        self.random = Mutex::new(source);
        self
    }

    /// Share a state tracker with other coordinators
    pub fn with_tracker(mut self, tracker: Arc<ProcessingStateTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn tracker(&self) -> &Arc<ProcessingStateTracker> {
        &self.tracker
    }

    pub fn document(&self) -> &Arc<Mutex<D>> {
        &self.document
    }

    /// Process segments with the default translator
    pub async fn process_segments(&self, segments: &[ContentSegment], options: ProcessOptions) -> ProcessingResult {
        self.process_segments_with(segments, Arc::clone(&self.translator), options)
            .await
    }

    /// Process segments with a specific translator for this call
    pub async fn process_segments_with(
        &self,
        segments: &[ContentSegment],
        translator: Arc<dyn Translator>,
        options: ProcessOptions,
    ) -> ProcessingResult {
        let _slot = PendingSlot::enter(&self.pending);
        let _turn = self.queue.lock().await;

        let started = Instant::now();
        let run_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        info!(
            "[{}] Processing {} segment(s){}",
            run_id,
            segments.len(),
            if options.lazy_loading { " (lazy load)" } else { "" }
        );

        let (admitted, skipped_count) = self.admit(&run_id, segments);

        let ctx = ExecutionContext::new(
            run_id.clone(),
            Arc::clone(&self.document),
            translator,
            Arc::clone(&self.tracker),
            options.display,
            self.pulse_duration,
        )
        .with_pronunciation(if self.pronunciation_enabled {
            self.pronunciation.clone()
        } else {
            None
        });

        let outcome = AssertUnwindSafe(self.execute(&ctx, &admitted))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(CoordinatorError::Fault(panic_message(payload.as_ref()))));

        let duration_ms = started.elapsed().as_millis() as u64;
        let result = match outcome {
            Ok(summary) => ProcessingResult {
                success: true,
                replacement_count: summary.total_replacements,
                segment_count: admitted.len(),
                skipped_count,
                processed_count: summary.processed_count,
                error_count: summary.error_count,
                error: summary.first_error().map(str::to_string),
                duration_ms,
                outcomes: summary.reports,
            },
            Err(e) => {
                error!("[{}] Run aborted: {}", run_id, e);
                self.abort(&run_id, &admitted, skipped_count, e, duration_ms)
            }
        };

        self.record_stats(&result);
        info!(
            "[{}] Done in {}ms: {} processed, {} skipped, {} errors, {} replacements",
            run_id,
            result.duration_ms,
            result.processed_count,
            result.skipped_count,
            result.error_count,
            result.replacement_count
        );

        result
    }

    /// Claim every segment that is not yet processed or in flight
    fn admit<'s>(&self, run_id: &str, segments: &'s [ContentSegment]) -> (Vec<&'s ContentSegment>, usize) {
        let mut admitted = Vec::with_capacity(segments.len());
        let mut skipped = 0;

        for segment in segments {
            let fingerprint = segment.fingerprint();
            if self.tracker.is_processed(fingerprint) || self.tracker.is_processing(fingerprint) {
                debug!("[{}] Skipping {} ({})", run_id, segment.dom_path(), fingerprint);
                skipped += 1;
                continue;
            }
            if !self.tracker.claim_start(fingerprint) {
                skipped += 1;
                continue;
            }
            admitted.push(segment);
        }

        (admitted, skipped)
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext<D>,
        admitted: &[&ContentSegment],
    ) -> Result<BatchSummary, CoordinatorError> {
        if admitted.is_empty() {
            return Ok(BatchSummary::default());
        }

        let word_counts: Vec<usize> = admitted.iter().map(|s| count_words(s.text_content())).collect();
        let plan = {
            let mut random = self.random.lock();
            self.planner.plan(&word_counts, &mut **random)
        };
        debug!(
            "[{}] {} words, target {} replacements: {:?}",
            ctx.run_id,
            word_counts.iter().sum::<usize>(),
            plan.target_total,
            plan.allocations
        );

        if plan.allocations.len() != admitted.len() {
            return Err(CoordinatorError::PlanMismatch {
                expected: admitted.len(),
                actual: plan.allocations.len(),
            });
        }

        let work: Vec<(&ContentSegment, usize)> = admitted.iter().copied().zip(plan.allocations).collect();
        Ok(self.executor.run(ctx, &work).await)
    }

    /// Fail every admitted segment still in flight and build the fault result
    fn abort(
        &self,
        run_id: &str,
        admitted: &[&ContentSegment],
        skipped_count: usize,
        fault: CoordinatorError,
        duration_ms: u64,
    ) -> ProcessingResult {
        let mut processed_count = 0;
        let mut replacement_count = 0;
        let mut error_count = 0;

        for segment in admitted {
            let fingerprint = segment.fingerprint();
            if self.tracker.is_processing(fingerprint) {
                self.tracker.mark_failed(fingerprint, segment.dom_path());
                debug!("[{}] Reverted {} to failed", run_id, segment.dom_path());
                error_count += 1;
            } else if let Some(record) = self.tracker.record(fingerprint) {
                if record.success {
                    processed_count += 1;
                    replacement_count += record.replacement_count;
                } else {
                    error_count += 1;
                }
            } else {
                error_count += 1;
            }
        }

        ProcessingResult {
            success: false,
            replacement_count,
            segment_count: admitted.len(),
            skipped_count,
            processed_count,
            error_count,
            error: Some(fault.to_string()),
            duration_ms,
            outcomes: Vec::new(),
        }
    }

    fn record_stats(&self, result: &ProcessingResult) {
        let mut stats = self.stats.lock();
        stats.total_processed += result.processed_count as u64;
        stats.total_skipped += result.skipped_count as u64;
        stats.total_errors += result.error_count as u64;
        stats.runs += 1;

        let duration = result.duration_ms as f64;
        stats.average_processing_time_ms = if stats.runs == 1 {
            duration
        } else {
            self.stats_smoothing * duration + (1.0 - self.stats_smoothing) * stats.average_processing_time_ms
        };
    }

    pub fn get_stats(&self) -> CoordinatorStats {
        self.stats.lock().clone()
    }

    pub fn reset_stats(&self) {
        *self.stats.lock() = CoordinatorStats::default();
    }

    /// Resolves once every call queued before this one has finished
    pub async fn wait_for_completion(&self) {
        let _turn = self.queue.lock().await;
    }

    /// Number of calls queued or running
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

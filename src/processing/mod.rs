/*!
 * Segment processing pipeline.
 *
 * - `state`: per-fingerprint lifecycle tracking
 * - `word_count`: mixed-script word estimation
 * - `allocation`: page-wide replacement budget
 * - `markup`: spans written for each replacement
 * - `range_mapper`: offset-to-node mapping and structural writes
 * - `executor`: bounded-parallel segment batches
 * - `coordinator`: queue, admission, and statistics
 */

pub mod allocation;
pub mod coordinator;
pub mod executor;
pub mod markup;
pub mod range_mapper;
pub mod state;
pub mod word_count;

pub use allocation::{AllocationPlan, AllocationPlanner, FixedSource, RandomSource, RngSource};
pub use coordinator::{CoordinatorStats, ProcessOptions, ProcessingCoordinator, ProcessingResult};
pub use executor::{BatchExecutor, SegmentReport};
pub use markup::{DisplaySettings, OriginalWordDisplayMode, TranslationPosition};
pub use state::{ProcessingStateTracker, ProcessingStatus};
pub use word_count::count_words;

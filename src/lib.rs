/*!
 * # WordWeave - bilingual vocabulary overlay
 *
 * A Rust library that rewrites page text in place so that a fraction of its
 * words show up alongside their translation.
 *
 * ## Features
 *
 * - Page-wide replacement budget spread fairly across text segments
 * - Mixed-script word counting (Latin words, CJK characters)
 * - Bounded-parallel segment processing with per-segment fault isolation
 * - Exactly-once processing per content fingerprint
 * - Structural writes that survive text drift between capture and write
 * - Pluggable translation and pronunciation collaborators
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: The text buffer abstraction and an in-memory document:
 *   - `document::memory`: Arena-backed document with HTML output
 *   - `document::fixture`: JSON and HTML page fixtures
 * - `segment`: Captured content segments and fingerprints
 * - `processing`: The processing pipeline:
 *   - `processing::state`: Processing state tracking
 *   - `processing::allocation`: Replacement budget planning
 *   - `processing::range_mapper`: Offset mapping and DOM writes
 *   - `processing::executor`: Batch execution
 *   - `processing::coordinator`: Queue, admission and statistics
 * - `providers`: Translator and pronunciation collaborators:
 *   - `providers::dictionary`: Glossary-backed translator
 *   - `providers::mock`: Deterministic translator for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod document;
pub mod errors;
pub mod processing;
pub mod providers;
pub mod segment;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{MemoryDocument, NodeId, TextBuffer};
pub use errors::{AppError, CoordinatorError, DocumentError, SegmentError, TranslatorError};
pub use processing::{CoordinatorStats, ProcessOptions, ProcessingCoordinator, ProcessingResult};
pub use providers::{PronunciationService, Replacement, TranslationResponse, Translator};
pub use segment::ContentSegment;

/*!
 * Error types for the wordweave library.
 *
 * This module contains custom error types for the different layers of the
 * coordinator, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

use crate::document::NodeId;

/// Errors that can occur when calling a translation collaborator
#[derive(Error, Debug, Clone)]
pub enum TranslatorError {
    /// The request to the translation backend failed
    #[error("Translation request failed: {0}")]
    RequestFailed(String),

    /// The backend response could not be parsed
    #[error("Failed to parse translation response: {0}")]
    ParseError(String),

    /// Error returned by the backend itself
    #[error("Translation backend responded with error: {status_code} - {message}")]
    ApiError {
        /// Status code reported by the backend
        status_code: u16,
        /// Error message from the backend
        message: String,
    },

    /// The backend rejected the request because of rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

/// Errors raised by a text buffer when a structural edit cannot be applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The node id does not exist in the document
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node exists but is not a text node
    #[error("Node {0} is not a text node")]
    NotText(NodeId),

    /// The node exists but is not an element
    #[error("Node {0} is not an element")]
    NotElement(NodeId),

    /// An offset points past the end of a text node
    #[error("Offset {offset} is out of bounds for node {node} (length {len})")]
    OffsetOutOfBounds {
        /// Node the offset refers to
        node: NodeId,
        /// Requested char offset
        offset: usize,
        /// Char length of the node
        len: usize,
    },

    /// The range does not cover any text node
    #[error("Range covers no text nodes")]
    EmptyRange,
}

/// Errors that end a single segment task.
///
/// These never abort sibling segments; they are converted into a failed
/// per-segment report by the batch executor.
#[derive(Error, Debug, Clone)]
pub enum SegmentError {
    /// The translation collaborator failed for this segment
    #[error("Translator error: {0}")]
    Translator(#[from] TranslatorError),

    /// The segment task panicked and was caught at the segment boundary
    #[error("Segment task panicked: {0}")]
    Panicked(String),
}

/// Errors that abort a whole `process_segments` call
#[derive(Error, Debug, Clone)]
pub enum CoordinatorError {
    /// A fault raised outside every per-segment boundary
    #[error("Processing fault: {0}")]
    Fault(String),

    /// The allocation plan does not line up with the admitted segments
    #[error("Allocation plan covers {actual} segments, expected {expected}")]
    PlanMismatch {
        /// Number of admitted segments
        expected: usize,
        /// Number of allocations produced
        actual: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the coordinator
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// Error from a translator
    #[error("Translator error: {0}")]
    Translator(#[from] TranslatorError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

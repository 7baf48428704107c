/*!
 * Text buffer abstraction over a live document.
 *
 * The coordinator never talks to a concrete document model directly. It only
 * needs an ordered list of text chunks with stable identity, some offset math,
 * and one environment-specific operation: replacing a span of text with
 * inline markup. This module defines that seam:
 *
 * - `TextBuffer`: the trait a document implementation provides
 * - `TextRange`: a span across one or more text nodes, in char offsets
 * - `InlineSpan`: one inline element to insert in place of a range
 * - `memory`: an arena-backed in-memory implementation
 * - `fixture`: JSON and HTML page fixtures used by the CLI and tests
 */

use std::fmt;

use crate::errors::DocumentError;

pub mod fixture;
pub mod memory;

pub use self::memory::MemoryDocument;

/// Stable identity of a node inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A span of text across one or more consecutive text nodes.
///
/// `nodes` lists every text node touched by the range in document order.
/// `start_offset` is a char offset into the first node and `end_offset` a
/// char offset into the last node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
    pub nodes: Vec<NodeId>,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl TextRange {
    /// Range inside a single text node
    pub fn single(node: NodeId, start_offset: usize, end_offset: usize) -> Self {
        Self {
            nodes: vec![node],
            start_offset,
            end_offset,
        }
    }

    /// Whether the range stays within one text node
    pub fn is_single_node(&self) -> bool {
        self.nodes.len() == 1
    }
}

/// One inline element inserted by a structural write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub tag: String,
    pub text: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

impl InlineSpan {
    /// Create a `<span>` holding `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            tag: "span".to_string(),
            text: text.into(),
            classes: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Add a class to the span
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add an attribute to the span
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// A document the coordinator can read text from and write markup into.
///
/// Offsets are always char offsets. Implementations must keep node ids
/// stable across edits: `replace_range` may shorten or empty text nodes and
/// insert new ones, but never renumbers existing nodes.
pub trait TextBuffer {
    /// Current content of a text node, `None` if the node is not text
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Parent element of a node
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Add a class to an element (no-op if already present)
    fn add_class(&mut self, element: NodeId, class: &str) -> Result<(), DocumentError>;

    /// Remove a class from an element (no-op if absent)
    fn remove_class(&mut self, element: NodeId, class: &str) -> Result<(), DocumentError>;

    /// Whether an element carries a class
    fn has_class(&self, element: NodeId, class: &str) -> bool;

    /// Set or overwrite an attribute on an element
    fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), DocumentError>;

    /// Read an attribute from an element
    fn attribute(&self, element: NodeId, name: &str) -> Option<&str>;

    /// Replace the content of `range` with `spans`, inserted in order.
    ///
    /// Returns the ids of the created span elements in the same order.
    fn replace_range(&mut self, range: &TextRange, spans: &[InlineSpan]) -> Result<Vec<NodeId>, DocumentError>;
}

/// Number of chars in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the char at `char_offset`, or `text.len()` at the end
pub fn byte_index(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}

/// Slice `text` between two char offsets
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let start_byte = byte_index(text, start)?;
    let end_byte = byte_index(text, end)?;
    text.get(start_byte..end_byte)
}

/// Char offset of the first occurrence of `needle` in `haystack`
pub fn char_find(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

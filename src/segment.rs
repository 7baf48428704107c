/*!
 * Content segments: the unit of work handed to the coordinator.
 *
 * A segment bundles the text of a run of text nodes with the ids of those
 * nodes and the container elements that show processing state. The nodes
 * belong to the document; a segment only refers to them.
 */

use sha2::{Digest, Sha256};

use crate::document::{NodeId, TextBuffer};

/// Number of hex chars kept from the SHA-256 digest
const FINGERPRINT_LEN: usize = 16;

/// One candidate unit of translatable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSegment {
    fingerprint: String,
    dom_path: String,
    text_content: String,
    text_nodes: Vec<NodeId>,
    elements: Vec<NodeId>,
}

impl ContentSegment {
    /// Build a segment from already known parts, fingerprinting the text
    pub fn new(
        dom_path: impl Into<String>,
        text_content: impl Into<String>,
        text_nodes: Vec<NodeId>,
        elements: Vec<NodeId>,
    ) -> Self {
        let text_content = text_content.into();
        Self {
            fingerprint: fingerprint(&text_content),
            dom_path: dom_path.into(),
            text_content,
            text_nodes,
            elements,
        }
    }

    /// Capture a segment from live text nodes.
    ///
    /// Returns `None` when the nodes carry no visible text.
    pub fn capture<B: TextBuffer + ?Sized>(
        buffer: &B,
        dom_path: impl Into<String>,
        text_nodes: Vec<NodeId>,
        elements: Vec<NodeId>,
    ) -> Option<Self> {
        let text: String = text_nodes.iter().filter_map(|node| buffer.text(*node)).collect();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self::new(dom_path, text, text_nodes, elements))
    }

    /// Replace the computed fingerprint with a caller-supplied identity
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn dom_path(&self) -> &str {
        &self.dom_path
    }

    /// Text as it was when the segment was captured
    pub fn text_content(&self) -> &str {
        &self.text_content
    }

    pub fn text_nodes(&self) -> &[NodeId] {
        &self.text_nodes
    }

    pub fn elements(&self) -> &[NodeId] {
        &self.elements
    }
}

/// Stable content hash used as the dedup key
pub fn fingerprint(text: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

/*!
 * Page fixtures.
 *
 * A JSON fixture describes a page as a list of text blocks. Loading one builds
 * a `MemoryDocument` and captures one `ContentSegment` per block, which is what
 * a document scanner would hand to the coordinator.
 *
 * HTML pages are parsed with html5ever into an `RcDom`, copied into a
 * `MemoryDocument`, and the `RcDom` is dropped. Each run of visible text
 * directly under an element becomes one segment.
 */

use anyhow::{Context, Result};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use log::debug;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::segment::ContentSegment;

use super::{MemoryDocument, NodeId, TextBuffer};

/// Elements whose content is never page text
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// One block of text, rendered as an element with one text node per entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockFixture {
    /// Element tag, `p` when omitted
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Structural locator used for logging
    #[serde(default)]
    pub path: Option<String>,

    /// Text node contents in order
    pub texts: Vec<String>,
}

/// A whole page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFixture {
    #[serde(default)]
    pub blocks: Vec<BlockFixture>,
}

fn default_tag() -> String {
    "p".to_string()
}

impl PageFixture {
    /// Parse a fixture from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse page fixture")
    }

    /// Load a fixture from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page fixture: {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Build the document and capture one segment per non-empty block
    pub fn build(&self) -> Result<(MemoryDocument, Vec<ContentSegment>)> {
        let mut doc = MemoryDocument::new();
        let mut segments = Vec::with_capacity(self.blocks.len());

        for (index, block) in self.blocks.iter().enumerate() {
            let element = doc.create_element(doc.root(), &block.tag)?;
            let mut text_nodes = Vec::with_capacity(block.texts.len());
            for text in &block.texts {
                text_nodes.push(doc.append_text(element, text)?);
            }

            let dom_path = block
                .path
                .clone()
                .unwrap_or_else(|| format!("body > {}:nth-child({})", block.tag, index + 1));
            if let Some(segment) = ContentSegment::capture(&doc, dom_path, text_nodes, vec![element]) {
                segments.push(segment);
            }
        }

        Ok((doc, segments))
    }

    /// Parse an HTML page, build its document and capture its text runs
    pub fn build_html(html: &str) -> Result<(MemoryDocument, Vec<ContentSegment>)> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .context("Failed to parse HTML page")?;

        let mut doc = MemoryDocument::new();
        let mut segments = Vec::new();
        match find_element(&dom.document, "body") {
            Some(body) => {
                let root = doc.root();
                import_children(&mut doc, &body, root, "body", &mut segments)?;
            }
            None => debug!("HTML page has no body element"),
        }

        Ok((doc, segments))
    }

    /// Load a page from disk: `.html`/`.htm` files as HTML, anything else as
    /// a JSON fixture
    pub fn load(path: impl AsRef<Path>) -> Result<(MemoryDocument, Vec<ContentSegment>)> {
        let path = path.as_ref();
        let is_html = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

        if is_html {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read HTML page: {}", path.display()))?;
            Self::build_html(&html)
        } else {
            Self::from_file(path)?.build()
        }
    }
}

fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = node.data {
        if &*name.local == tag {
            return Some(node.clone());
        }
    }
    node.children.borrow().iter().find_map(|child| find_element(child, tag))
}

/// Copy the children of `source` under `parent`, capturing text runs on the way
fn import_children(
    doc: &mut MemoryDocument,
    source: &Handle,
    parent: NodeId,
    parent_path: &str,
    segments: &mut Vec<ContentSegment>,
) -> Result<()> {
    let mut text_runs = Vec::new();
    let mut nested = Vec::new();
    let mut element_index = 0;

    for child in source.children.borrow().iter() {
        match child.data {
            NodeData::Text { ref contents } => {
                let node = doc.append_text(parent, &contents.borrow())?;
                text_runs.push(node);
            }
            NodeData::Element {
                ref name, ref attrs, ..
            } => {
                element_index += 1;
                let tag = name.local.to_string();
                if SKIPPED_ELEMENTS.contains(&tag.as_str()) {
                    continue;
                }
                let element = doc.create_element(parent, &tag)?;
                for attr in attrs.borrow().iter() {
                    if &*attr.name.local == "class" {
                        for class in attr.value.split_whitespace() {
                            doc.add_class(element, class)?;
                        }
                    } else {
                        doc.set_attribute(element, &attr.name.local, &attr.value)?;
                    }
                }
                let path = format!("{} > {}:nth-child({})", parent_path, tag, element_index);
                nested.push((child.clone(), element, path));
            }
            _ => {}
        }
    }

    // Runs are captured before nested elements so segments stay in document order
    let visible: Vec<NodeId> = text_runs
        .into_iter()
        .filter(|node| doc.text(*node).is_some_and(|t| !t.trim().is_empty()))
        .collect();
    let multiple = visible.len() > 1;
    for (run, node) in visible.into_iter().enumerate() {
        let dom_path = if multiple {
            format!("{} > text()[{}]", parent_path, run + 1)
        } else {
            parent_path.to_string()
        };
        if let Some(segment) = ContentSegment::capture(&*doc, dom_path, vec![node], vec![parent]) {
            segments.push(segment);
        }
    }

    for (handle, element, path) in nested {
        import_children(doc, &handle, element, &path, segments)?;
    }
    Ok(())
}

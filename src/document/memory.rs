/*!
 * In-memory document implementing the `TextBuffer` seam.
 *
 * Nodes live in an arena and are addressed by `NodeId`. Ids are never
 * reused, so segments captured before an edit keep pointing at the same
 * nodes afterwards. HTML output goes through html5ever's serializer, driven
 * by a borrowed view over the arena.
 */

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::{LocalName, QualName, namespace_url, ns};
use log::debug;
use std::io;

use crate::errors::DocumentError;

use super::{InlineSpan, NodeId, TextBuffer, TextRange, byte_index, char_len};

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        classes: Vec<String>,
        attributes: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    Text {
        content: String,
    },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Arena-backed document with a single `<body>` root
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document containing only the body element
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Element {
                    tag: "body".to_string(),
                    classes: Vec::new(),
                    attributes: Vec::new(),
                    children: Vec::new(),
                },
            }],
        }
    }

    /// The body element
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new element under `parent`
    pub fn create_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DocumentError> {
        let id = self.push_node(
            Some(parent),
            NodeKind::Element {
                tag: tag.to_string(),
                classes: Vec::new(),
                attributes: Vec::new(),
                children: Vec::new(),
            },
        );
        self.children_mut(parent)?.push(id);
        Ok(id)
    }

    /// Append a new text node under `parent`
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> Result<NodeId, DocumentError> {
        let id = self.push_node(
            Some(parent),
            NodeKind::Text {
                content: content.to_string(),
            },
        );
        self.children_mut(parent)?.push(id);
        Ok(id)
    }

    /// Overwrite the content of a text node, as a page script would
    pub fn set_text(&mut self, node: NodeId, content: &str) -> Result<(), DocumentError> {
        *self.text_mut(node)? = content.to_string();
        Ok(())
    }

    /// Children of an element, empty for text nodes and unknown ids
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element { children, .. }) => children,
            _ => &[],
        }
    }

    /// Tag name of an element
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag),
            _ => None,
        }
    }

    /// Borrowed view of `node` that html5ever can serialize
    pub fn html_view(&self, node: NodeId) -> HtmlView<'_> {
        HtmlView { document: self, node }
    }

    /// Concatenated text of a node and all its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// Elements under `node` (inclusive) carrying `class`, in document order
    pub fn find_by_class(&self, node: NodeId, class: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_class(node, class, &mut found);
        found
    }

    /// Serialize the whole document as HTML
    pub fn to_html(&self) -> String {
        let mut buf: Vec<u8> = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::IncludeNode,
            ..SerializeOpts::default()
        };
        if let Err(e) = serialize(&mut buf, &self.html_view(self.root()), opts) {
            debug!("HTML serialization stopped early: {}", e);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        self.nodes.push(Node { parent, kind });
        NodeId(self.nodes.len() - 1)
    }

    fn children_mut(&mut self, node: NodeId) -> Result<&mut Vec<NodeId>, DocumentError> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element { children, .. }) => Ok(children),
            Some(NodeKind::Text { .. }) => Err(DocumentError::NotElement(node)),
            None => Err(DocumentError::UnknownNode(node)),
        }
    }

    fn text_mut(&mut self, node: NodeId) -> Result<&mut String, DocumentError> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Text { content }) => Ok(content),
            Some(NodeKind::Element { .. }) => Err(DocumentError::NotText(node)),
            None => Err(DocumentError::UnknownNode(node)),
        }
    }

    fn text_checked(&self, node: NodeId) -> Result<&str, DocumentError> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Text { content }) => Ok(content),
            Some(NodeKind::Element { .. }) => Err(DocumentError::NotText(node)),
            None => Err(DocumentError::UnknownNode(node)),
        }
    }

    fn element_parts_mut(
        &mut self,
        node: NodeId,
    ) -> Result<(&mut Vec<String>, &mut Vec<(String, String)>), DocumentError> {
        match self.nodes.get_mut(node.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element {
                classes, attributes, ..
            }) => Ok((classes, attributes)),
            Some(NodeKind::Text { .. }) => Err(DocumentError::NotElement(node)),
            None => Err(DocumentError::UnknownNode(node)),
        }
    }

    /// Split `content` at a char offset, checking bounds
    fn split_at_char(node: NodeId, content: &str, offset: usize) -> Result<(String, String), DocumentError> {
        let idx = byte_index(content, offset).ok_or(DocumentError::OffsetOutOfBounds {
            node,
            offset,
            len: char_len(content),
        })?;
        Ok((content[..idx].to_string(), content[idx..].to_string()))
    }

    fn insert_after(&mut self, anchor: NodeId, new_nodes: &[NodeId]) -> Result<(), DocumentError> {
        let parent = self
            .nodes
            .get(anchor.0)
            .and_then(|n| n.parent)
            .ok_or(DocumentError::UnknownNode(anchor))?;
        let children = self.children_mut(parent)?;
        let position = children
            .iter()
            .position(|child| *child == anchor)
            .ok_or(DocumentError::UnknownNode(anchor))?;
        for (i, node) in new_nodes.iter().enumerate() {
            children.insert(position + 1 + i, *node);
        }
        Ok(())
    }

    fn build_span(&mut self, parent: NodeId, span: &InlineSpan) -> NodeId {
        let element = self.push_node(
            Some(parent),
            NodeKind::Element {
                tag: span.tag.clone(),
                classes: span.classes.clone(),
                attributes: span.attributes.clone(),
                children: Vec::new(),
            },
        );
        let text = self.push_node(
            Some(element),
            NodeKind::Text {
                content: span.text.clone(),
            },
        );
        if let Some(Node {
            kind: NodeKind::Element { children, .. },
            ..
        }) = self.nodes.get_mut(element.0)
        {
            children.push(text);
        }
        element
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Text { content }) => out.push_str(content),
            Some(NodeKind::Element { children, .. }) => {
                for child in children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    fn collect_by_class(&self, node: NodeId, class: &str, found: &mut Vec<NodeId>) {
        if let Some(NodeKind::Element { classes, children, .. }) = self.nodes.get(node.0).map(|n| &n.kind) {
            if classes.iter().any(|c| c == class) {
                found.push(node);
            }
            for child in children {
                self.collect_by_class(*child, class, found);
            }
        }
    }
}

impl TextBuffer for MemoryDocument {
    fn text(&self, node: NodeId) -> Option<&str> {
        self.text_checked(node).ok()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn add_class(&mut self, element: NodeId, class: &str) -> Result<(), DocumentError> {
        let (classes, _) = self.element_parts_mut(element)?;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, element: NodeId, class: &str) -> Result<(), DocumentError> {
        let (classes, _) = self.element_parts_mut(element)?;
        classes.retain(|c| c != class);
        Ok(())
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        match self.nodes.get(element.0).map(|n| &n.kind) {
            Some(NodeKind::Element { classes, .. }) => classes.iter().any(|c| c == class),
            _ => false,
        }
    }

    fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        let (_, attributes) = self.element_parts_mut(element)?;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(element.0).map(|n| &n.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn replace_range(&mut self, range: &TextRange, spans: &[InlineSpan]) -> Result<Vec<NodeId>, DocumentError> {
        let (&first, &last) = match (range.nodes.first(), range.nodes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(DocumentError::EmptyRange),
        };
        let parent = self.parent(first).ok_or(DocumentError::UnknownNode(first))?;

        // Validate everything before mutating so a bad range leaves no trace.
        for node in &range.nodes {
            self.text_checked(*node)?;
        }
        let (prefix, first_rest) = Self::split_at_char(first, self.text_checked(first)?, range.start_offset)?;
        let suffix = if range.is_single_node() {
            let rest_len = char_len(&first_rest);
            let local_end = range
                .end_offset
                .checked_sub(range.start_offset)
                .ok_or(DocumentError::OffsetOutOfBounds {
                    node: first,
                    offset: range.end_offset,
                    len: rest_len,
                })?;
            Self::split_at_char(first, &first_rest, local_end)?.1
        } else {
            Self::split_at_char(last, self.text_checked(last)?, range.end_offset)?.1
        };

        *self.text_mut(first)? = prefix;
        if !range.is_single_node() {
            for node in &range.nodes[1..range.nodes.len() - 1] {
                self.text_mut(*node)?.clear();
            }
        }

        let created: Vec<NodeId> = spans.iter().map(|span| self.build_span(parent, span)).collect();
        let mut inserted = created.clone();
        if range.is_single_node() {
            if !suffix.is_empty() {
                inserted.push(self.push_node(Some(parent), NodeKind::Text { content: suffix }));
            }
        } else {
            *self.text_mut(last)? = suffix;
        }
        self.insert_after(first, &inserted)?;

        Ok(created)
    }
}

/// A node of a `MemoryDocument` as seen by the html5ever serializer
#[derive(Debug, Clone, Copy)]
pub struct HtmlView<'a> {
    document: &'a MemoryDocument,
    node: NodeId,
}

fn html_name(local: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(local))
}

fn attribute_name(local: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(local))
}

impl Serialize for HtmlView<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match self.document.nodes.get(self.node.0).map(|n| &n.kind) {
            Some(NodeKind::Text { content }) => serializer.write_text(content),
            Some(NodeKind::Element {
                tag,
                classes,
                attributes,
                children,
            }) => {
                let name = html_name(tag);
                let include_node = matches!(traversal_scope, TraversalScope::IncludeNode);

                if include_node {
                    let class_list = classes.join(" ");
                    let mut attrs: Vec<(QualName, &str)> = Vec::with_capacity(attributes.len() + 1);
                    if !classes.is_empty() {
                        attrs.push((attribute_name("class"), class_list.as_str()));
                    }
                    for (attr, value) in attributes {
                        attrs.push((attribute_name(attr), value.as_str()));
                    }
                    serializer.start_elem(name.clone(), attrs.iter().map(|(n, v)| (n, *v)))?;
                }

                for child in children {
                    self.document
                        .html_view(*child)
                        .serialize(serializer, TraversalScope::IncludeNode)?;
                }

                if include_node {
                    serializer.end_elem(name)?;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}

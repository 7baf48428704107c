/*!
 * Range mapping and structural writes.
 *
 * Replacements arrive as char offsets into a segment's text. Before writing,
 * the text is rebuilt from the live nodes, every replacement is checked
 * against it (and relocated by substring search if it drifted), and the
 * offsets are mapped back onto the node/offset pairs of a `TextRange`.
 * Replacements are applied from the end of the text towards the start so
 * that each write leaves the offsets of the remaining ones intact.
 *
 * A bad replacement is dropped on its own; it never aborts the segment.
 */

use chrono::Utc;
use log::debug;
use std::collections::HashSet;

use crate::document::{NodeId, TextBuffer, TextRange, char_find, char_len, char_slice};
use crate::providers::Replacement;

use super::markup::{DisplaySettings, PROCESSED_ATTRIBUTE};

/// A replacement checked against the current text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedReplacement {
    pub original: String,
    pub translation: String,
    pub start: usize,
    pub end: usize,
    /// The offsets came from a substring search, not from the collaborator
    pub relocated: bool,
}

/// A replacement that made it into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReplacement {
    pub original: String,
    pub translation: String,
    pub start: usize,
    /// Span element holding the translation
    pub translation_span: NodeId,
}

/// Outcome of writing one segment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// In application order (descending start)
    pub applied: Vec<AppliedReplacement>,
    pub relocated: usize,
    pub discarded: usize,
}

/// Concatenated current text of `text_nodes`
pub fn current_text<B: TextBuffer + ?Sized>(buffer: &B, text_nodes: &[NodeId]) -> String {
    text_nodes.iter().filter_map(|node| buffer.text(*node)).collect()
}

/// Check a replacement against `full_text`, relocating it to the first
/// occurrence of its original text when the offsets no longer match
pub fn locate(full_text: &str, replacement: &Replacement) -> Option<LocatedReplacement> {
    if replacement.original.is_empty() {
        return None;
    }
    let Replacement {
        original,
        translation,
        position,
    } = replacement;

    if char_slice(full_text, position.start, position.end) == Some(original.as_str()) {
        return Some(LocatedReplacement {
            original: original.clone(),
            translation: translation.clone(),
            start: position.start,
            end: position.end,
            relocated: false,
        });
    }

    let start = char_find(full_text, original)?;
    Some(LocatedReplacement {
        original: original.clone(),
        translation: translation.clone(),
        start,
        end: start + char_len(original),
        relocated: true,
    })
}

/// Locate every replacement and order them for application.
///
/// Returns the replacements in descending start order with overlaps removed,
/// plus the number of replacements dropped.
pub fn plan_writes(full_text: &str, replacements: &[Replacement]) -> (Vec<LocatedReplacement>, usize) {
    let mut located: Vec<LocatedReplacement> = replacements
        .iter()
        .filter_map(|r| locate(full_text, r))
        .collect();
    let mut discarded = replacements.len() - located.len();

    located.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut accepted = Vec::with_capacity(located.len());
    let mut boundary = usize::MAX;
    for replacement in located {
        if replacement.end <= boundary {
            boundary = replacement.start;
            accepted.push(replacement);
        } else {
            debug!(
                "Dropping overlapping replacement '{}' at {}..{}",
                replacement.original, replacement.start, replacement.end
            );
            discarded += 1;
        }
    }

    (accepted, discarded)
}

/// Map char offsets of the concatenated text onto a range over `text_nodes`
pub fn resolve_range<B: TextBuffer + ?Sized>(
    buffer: &B,
    text_nodes: &[NodeId],
    start: usize,
    end: usize,
) -> Option<TextRange> {
    if start >= end {
        return None;
    }

    let mut accumulated = 0;
    let mut start_at: Option<(usize, usize)> = None;

    for (index, node) in text_nodes.iter().enumerate() {
        let len = char_len(buffer.text(*node)?);
        let node_start = accumulated;
        let node_end = accumulated + len;

        if start_at.is_none() && start >= node_start && start < node_end {
            start_at = Some((index, start - node_start));
        }
        if let Some((first, start_offset)) = start_at {
            if end > node_start && end <= node_end {
                return Some(TextRange {
                    nodes: text_nodes[first..=index].to_vec(),
                    start_offset,
                    end_offset: end - node_start,
                });
            }
        }
        accumulated = node_end;
    }

    None
}

/// Text currently covered by `range`
pub fn extract_range_text<B: TextBuffer + ?Sized>(buffer: &B, range: &TextRange) -> Option<String> {
    let last = range.nodes.len().checked_sub(1)?;
    let mut out = String::new();

    for (index, node) in range.nodes.iter().enumerate() {
        let text = buffer.text(*node)?;
        let from = if index == 0 { range.start_offset } else { 0 };
        let to = if index == last { range.end_offset } else { char_len(text) };
        out.push_str(char_slice(text, from, to)?);
    }

    Some(out)
}

/// Tag every distinct parent of `text_nodes` as processed at `timestamp_ms`
pub fn mark_processed<B: TextBuffer + ?Sized>(buffer: &mut B, text_nodes: &[NodeId], timestamp_ms: i64) {
    let mut seen = HashSet::new();
    let value = timestamp_ms.to_string();
    for node in text_nodes {
        let Some(parent) = buffer.parent(*node) else {
            continue;
        };
        if seen.insert(parent) {
            if let Err(e) = buffer.set_attribute(parent, PROCESSED_ATTRIBUTE, &value) {
                debug!("Could not mark {} as processed: {}", parent, e);
            }
        }
    }
}

/// Apply `replacements` to the segment made of `text_nodes`.
///
/// The text node parents are tagged as processed whether or not any
/// replacement was applied.
pub fn write_segment<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    text_nodes: &[NodeId],
    replacements: &[Replacement],
    settings: &DisplaySettings,
) -> WriteReport {
    let full_text = current_text(buffer, text_nodes);
    let (located, mut discarded) = plan_writes(&full_text, replacements);
    let mut report = WriteReport::default();

    for replacement in located {
        let Some(range) = resolve_range(buffer, text_nodes, replacement.start, replacement.end) else {
            debug!("No text range for '{}' at {}", replacement.original, replacement.start);
            discarded += 1;
            continue;
        };

        let expected = char_slice(&full_text, replacement.start, replacement.end);
        let extracted = extract_range_text(buffer, &range);
        if extracted.as_deref() != expected {
            debug!(
                "Range text {:?} does not match {:?}, skipping",
                extracted, expected
            );
            discarded += 1;
            continue;
        }

        let markup = settings.render(&replacement.original, &replacement.translation);
        match buffer.replace_range(&range, &markup.spans) {
            Ok(created) => {
                let Some(span) = created.get(markup.translation_index).copied() else {
                    discarded += 1;
                    continue;
                };
                if replacement.relocated {
                    report.relocated += 1;
                }
                report.applied.push(AppliedReplacement {
                    original: replacement.original,
                    translation: replacement.translation,
                    start: replacement.start,
                    translation_span: span,
                });
            }
            Err(e) => {
                debug!("Failed to write '{}': {}", replacement.original, e);
                discarded += 1;
            }
        }
    }

    mark_processed(buffer, text_nodes, Utc::now().timestamp_millis());
    report.discarded = discarded;
    report
}

/*!
 * Tests for range mapping and structural writes against a memory document
 */

use wordweave::document::{MemoryDocument, NodeId, TextBuffer};
use wordweave::processing::markup::{DisplaySettings, PROCESSED_ATTRIBUTE, TRANSLATION_CLASS};
use wordweave::processing::range_mapper::{mark_processed, resolve_range, write_segment};
use wordweave::providers::Replacement;

fn paragraph(texts: &[&str]) -> (MemoryDocument, NodeId, Vec<NodeId>) {
    let mut doc = MemoryDocument::new();
    let p = doc.create_element(doc.root(), "p").unwrap();
    let nodes = texts.iter().map(|t| doc.append_text(p, t).unwrap()).collect();
    (doc, p, nodes)
}

#[test]
fn test_writeSegment_acrossTextNodes_shouldPreserveSurroundingText() {
    let (mut doc, p, nodes) = paragraph(&["Hello wo", "rld again"]);

    let report = write_segment(
        &mut doc,
        &nodes,
        &[Replacement::new("world", "monde", 6, 11)],
        &DisplaySettings::default(),
    );

    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.discarded, 0);
    assert_eq!(doc.text_content(p), "Hello world (monde) again");
    let span = report.applied[0].translation_span;
    assert!(doc.has_class(span, TRANSLATION_CLASS));
    assert_eq!(doc.text(doc.children(span)[0]), Some("(monde)"));
}

#[test]
fn test_writeSegment_withAstralCharacters_shouldUseCharOffsets() {
    let (mut doc, p, nodes) = paragraph(&["I \u{2764} Rust \u{1F980} crab"]);

    let report = write_segment(
        &mut doc,
        &nodes,
        &[Replacement::new("crab", "crabe", 11, 15)],
        &DisplaySettings::default(),
    );

    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.relocated, 0);
    assert_eq!(doc.text_content(p), "I \u{2764} Rust \u{1F980} crab (crabe)");
}

#[test]
fn test_writeSegment_afterTextDrift_shouldRelocateOrDiscard() {
    let (mut doc, p, nodes) = paragraph(&["The cat sat on the mat"]);
    // the page changed after capture
    doc.set_text(nodes[0], "Today the cat sat on the mat").unwrap();

    let report = write_segment(
        &mut doc,
        &nodes,
        &[
            Replacement::new("cat", "chat", 4, 7),
            Replacement::new("dog", "chien", 8, 11),
        ],
        &DisplaySettings::default(),
    );

    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.relocated, 1);
    assert_eq!(report.discarded, 1);
    assert_eq!(doc.text_content(p), "Today the cat (chat) sat on the mat");
}

#[test]
fn test_writeSegment_withOverlappingReplacements_shouldKeepOne() {
    let (mut doc, _, nodes) = paragraph(&["flights to new york today"]);

    let report = write_segment(
        &mut doc,
        &nodes,
        &[
            Replacement::new("new york", "nueva york", 11, 19),
            Replacement::new("york", "york", 15, 19),
        ],
        &DisplaySettings::default(),
    );

    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.discarded, 1);
}

#[test]
fn test_markProcessed_withSharedParent_shouldTagOnce() {
    let (mut doc, p, nodes) = paragraph(&["one ", "two"]);

    mark_processed(&mut doc, &nodes, 1_700_000_000_000);

    assert_eq!(doc.attribute(p, PROCESSED_ATTRIBUTE), Some("1700000000000"));
}

#[test]
fn test_resolveRange_pastEndOfText_shouldBeNone() {
    let (doc, _, nodes) = paragraph(&["short"]);
    assert!(resolve_range(&doc, &nodes, 3, 9).is_none());
    assert!(resolve_range(&doc, &nodes, 2, 2).is_none());
    assert!(resolve_range(&doc, &nodes, 0, 5).is_some());
}

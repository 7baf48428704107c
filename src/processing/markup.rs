/*!
 * Markup produced for an applied replacement.
 *
 * Each replacement turns into two adjacent inline spans, one holding the
 * original text and one holding the translation. Display settings control
 * their order, whether the translation is parenthesized and how the original
 * is presented.
 */

use serde::{Deserialize, Serialize};

use crate::document::InlineSpan;

pub const ORIGINAL_CLASS: &str = "ww-original";
pub const ORIGINAL_HIDDEN_CLASS: &str = "ww-original--hidden";
pub const ORIGINAL_LEARNING_CLASS: &str = "ww-original--learning";
pub const TRANSLATION_CLASS: &str = "ww-translation";
/// Transient "just applied" pulse on translation spans
pub const FRESH_CLASS: &str = "ww-translation--fresh";
/// Added to segment containers while their task runs
pub const PROCESSING_CLASS: &str = "ww-processing";
/// Set on text node parents once a segment has been written
pub const PROCESSED_ATTRIBUTE: &str = "data-ww-processed";
pub const ORIGINAL_ATTRIBUTE: &str = "data-original";

/// How the original word is presented next to its translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginalWordDisplayMode {
    #[default]
    Visible,
    /// Removed from layout
    Hidden,
    /// Revealed on hover
    Learning,
}

/// Where the translation goes relative to the original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationPosition {
    Before,
    #[default]
    After,
}

/// Presentation options for written replacements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub original_word_display_mode: OriginalWordDisplayMode,

    #[serde(default)]
    pub translation_position: TranslationPosition,

    #[serde(default = "default_true")]
    pub show_parentheses: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            original_word_display_mode: OriginalWordDisplayMode::default(),
            translation_position: TranslationPosition::default(),
            show_parentheses: true,
        }
    }
}

/// Spans for one replacement, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementMarkup {
    pub spans: Vec<InlineSpan>,
    /// Index of the translation span within `spans`
    pub translation_index: usize,
}

impl DisplaySettings {
    /// Text shown in the translation span
    pub fn translation_text(&self, translation: &str) -> String {
        if self.show_parentheses {
            format!("({})", translation)
        } else {
            translation.to_string()
        }
    }

    /// Build the original/translation span pair for a replacement.
    ///
    /// A single space separates the pair; it lives on the trailing side of the
    /// first span so the replaced text keeps its surrounding whitespace.
    pub fn render(&self, original: &str, translation: &str) -> ReplacementMarkup {
        let mut original_span = InlineSpan::new(original).with_class(ORIGINAL_CLASS);
        match self.original_word_display_mode {
            OriginalWordDisplayMode::Visible => {}
            OriginalWordDisplayMode::Hidden => original_span = original_span.with_class(ORIGINAL_HIDDEN_CLASS),
            OriginalWordDisplayMode::Learning => original_span = original_span.with_class(ORIGINAL_LEARNING_CLASS),
        }

        let translation_span = InlineSpan::new(self.translation_text(translation))
            .with_class(TRANSLATION_CLASS)
            .with_class(FRESH_CLASS)
            .with_attribute(ORIGINAL_ATTRIBUTE, original);

        match self.translation_position {
            TranslationPosition::After => {
                original_span.text.push(' ');
                ReplacementMarkup {
                    spans: vec![original_span, translation_span],
                    translation_index: 1,
                }
            }
            TranslationPosition::Before => {
                let mut translation_span = translation_span;
                translation_span.text.push(' ');
                ReplacementMarkup {
                    spans: vec![translation_span, original_span],
                    translation_index: 0,
                }
            }
        }
    }
}

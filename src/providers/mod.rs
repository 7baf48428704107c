/*!
 * Collaborator interfaces for the coordinator.
 *
 * The coordinator does not translate anything itself. It asks a `Translator`
 * for replacements and, optionally, a `PronunciationService` to decorate the
 * written spans. Implementations in this module:
 * - `dictionary`: glossary-backed local translator
 * - `mock`: deterministic translator with selectable behaviors for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::document::NodeId;
use crate::errors::TranslatorError;

/// Char offsets into a segment's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

/// One word or phrase to be replaced with its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub original: String,
    pub translation: String,
    pub position: Position,
}

impl Replacement {
    pub fn new(original: impl Into<String>, translation: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            original: original.into(),
            translation: translation.into(),
            position: Position { start, end },
        }
    }
}

/// Response of a translation collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResponse {
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

/// Translation backend used by the coordinator
///
/// Implementations receive the full segment text and the number of
/// replacements the allocation planner assigned to it. They are trusted to
/// return roughly that many, but the coordinator applies every valid
/// replacement it receives.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Select and translate words from `text`
    ///
    /// # Arguments
    /// * `text` - The segment text
    /// * `target_count` - Planned number of replacements, if any
    ///
    /// # Returns
    /// * `Result<TranslationResponse, TranslatorError>` - Replacements with char offsets into `text`
    async fn translate(&self, text: &str, target_count: Option<usize>) -> Result<TranslationResponse, TranslatorError>;
}

/// Optional collaborator attaching pronunciation data to a translation span
#[async_trait]
pub trait PronunciationService: Send + Sync + Debug {
    async fn add_pronunciation(&self, element: NodeId, text: &str) -> Result<(), TranslatorError>;
}

pub mod dictionary;
pub mod mock;

/*!
 * Mock translator implementations for testing.
 *
 * `MockTranslator` simulates different collaborator behaviors:
 * - `MockTranslator::working()` - replaces the first N Latin words
 * - `MockTranslator::failing()` - always fails with an error
 * - `MockTranslator::fail_on(..)` - fails only for texts containing a needle
 * - `MockTranslator::drifting()` - returns positions shifted by one char
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::document::NodeId;
use crate::errors::TranslatorError;
use crate::providers::{PronunciationService, Replacement, TranslationResponse, Translator};

static LATIN_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z'-]*").unwrap());

/// Behavior mode for the mock translator
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Replaces the first `target_count` Latin words with `<word>-tr`
    Working,
    /// Always fails with an error
    Failing,
    /// Fails when the text contains the needle, works otherwise
    FailOn(String),
    /// Succeeds with no replacements
    Empty,
    /// Works after sleeping
    Slow { delay_ms: u64 },
    /// Works, but every position is shifted right by one char
    Drifting,
    /// Panics inside the collaborator call
    Panicking,
}

/// Mock translator for testing coordinator behavior
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    /// Shared across clones
    call_count: Arc<AtomicUsize>,
    last_target: Arc<Mutex<Option<usize>>>,
    seen_texts: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            last_target: Arc::new(Mutex::new(None)),
            seen_texts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_on(needle: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailOn(needle.into()))
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn drifting() -> Self {
        Self::new(MockBehavior::Drifting)
    }

    pub fn panicking() -> Self {
        Self::new(MockBehavior::Panicking)
    }

    /// Number of `translate` calls so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Target count received by the most recent call
    pub fn last_target(&self) -> Option<usize> {
        *self.last_target.lock()
    }

    /// Every text received, in call order
    pub fn seen_texts(&self) -> Vec<String> {
        self.seen_texts.lock().clone()
    }

    /// Build `<word>-tr` replacements for the first `limit` Latin words
    pub fn generate_replacements(text: &str, limit: Option<usize>) -> Vec<Replacement> {
        LATIN_WORD
            .find_iter(text)
            .take(limit.unwrap_or(usize::MAX))
            .map(|m| {
                let start = text[..m.start()].chars().count();
                let end = start + m.as_str().chars().count();
                Replacement::new(m.as_str(), format!("{}-tr", m.as_str()), start, end)
            })
            .collect()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_count: Option<usize>) -> Result<TranslationResponse, TranslatorError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_target.lock() = target_count;
        self.seen_texts.lock().push(text.to_string());

        match &self.behavior {
            MockBehavior::Working => Ok(TranslationResponse {
                replacements: Self::generate_replacements(text, target_count),
            }),

            MockBehavior::Failing => Err(TranslatorError::ApiError {
                status_code: 500,
                message: "Simulated translator failure".to_string(),
            }),

            MockBehavior::FailOn(needle) => {
                if text.contains(needle.as_str()) {
                    Err(TranslatorError::RequestFailed(format!("Simulated failure for '{}'", needle)))
                } else {
                    Ok(TranslationResponse {
                        replacements: Self::generate_replacements(text, target_count),
                    })
                }
            }

            MockBehavior::Empty => Ok(TranslationResponse::default()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(TranslationResponse {
                    replacements: Self::generate_replacements(text, target_count),
                })
            }

            MockBehavior::Drifting => {
                let replacements = Self::generate_replacements(text, target_count)
                    .into_iter()
                    .map(|mut r| {
                        r.position.start += 1;
                        r.position.end += 1;
                        r
                    })
                    .collect();
                Ok(TranslationResponse { replacements })
            }

            MockBehavior::Panicking => panic!("Simulated translator panic"),
        }
    }
}

/// Pronunciation collaborator that records the requests it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingPronunciation {
    calls: Arc<Mutex<Vec<(NodeId, String)>>>,
}

impl RecordingPronunciation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(span, text)` pairs in call order
    pub fn calls(&self) -> Vec<(NodeId, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PronunciationService for RecordingPronunciation {
    async fn add_pronunciation(&self, element: NodeId, text: &str) -> Result<(), TranslatorError> {
        self.calls.lock().push((element, text.to_string()));
        Ok(())
    }
}

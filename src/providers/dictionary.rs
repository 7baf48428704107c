/*!
 * Glossary-backed translator.
 *
 * Looks up Latin words of a segment in a word → translation map and returns
 * replacements for the first occurrence of each known word, in text order.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::errors::TranslatorError;
use crate::providers::{Replacement, TranslationResponse, Translator};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z\x{00C0}-\x{024F}][A-Za-z\x{00C0}-\x{024F}'-]*").unwrap());

/// Local translator backed by an in-memory glossary
#[derive(Debug, Clone, Default)]
pub struct DictionaryTranslator {
    /// Keys are lowercase
    entries: HashMap<String, String>,
}

impl DictionaryTranslator {
    /// Create a translator from word/translation pairs
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Parse a `{ "word": "translation" }` JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, String> =
            serde_json::from_str(json).context("Failed to parse dictionary JSON")?;
        Ok(Self::new(entries))
    }

    /// Load a dictionary from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary: {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replacements for known words, first occurrence of each, at most `limit`
    pub fn lookup(&self, text: &str, limit: Option<usize>) -> Vec<Replacement> {
        let mut seen = HashSet::new();
        let mut replacements = Vec::new();
        let limit = limit.unwrap_or(usize::MAX);

        for m in WORD.find_iter(text) {
            if replacements.len() >= limit {
                break;
            }
            let key = m.as_str().to_lowercase();
            let Some(translation) = self.entries.get(&key) else {
                continue;
            };
            if !seen.insert(key) {
                continue;
            }
            let start = text[..m.start()].chars().count();
            let end = start + m.as_str().chars().count();
            replacements.push(Replacement::new(m.as_str(), translation.clone(), start, end));
        }

        replacements
    }
}

#[async_trait]
impl Translator for DictionaryTranslator {
    async fn translate(&self, text: &str, target_count: Option<usize>) -> Result<TranslationResponse, TranslatorError> {
        let replacements = self.lookup(text, target_count);
        debug!(
            "Dictionary matched {} word(s) (target {:?})",
            replacements.len(),
            target_count
        );
        Ok(TranslationResponse { replacements })
    }
}

/*!
 * Common test utilities for the wordweave test suite
 */

use anyhow::Result;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use wordweave::app_config::Config;
use wordweave::document::MemoryDocument;
use wordweave::processing::{FixedSource, ProcessingCoordinator};
use wordweave::providers::Translator;
use wordweave::segment::ContentSegment;


/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Build a document with one paragraph per text and capture a segment for each
pub fn build_page(texts: &[&str]) -> (Arc<Mutex<MemoryDocument>>, Vec<ContentSegment>) {
    let mut doc = MemoryDocument::new();
    let mut segments = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        let p = doc.create_element(doc.root(), "p").unwrap();
        let node = doc.append_text(p, text).unwrap();
        segments.push(ContentSegment::capture(&doc, format!("body > p:nth-child({})", i + 1), vec![node], vec![p]).unwrap());
    }
    (Arc::new(Mutex::new(doc)), segments)
}

/// Configuration with a short pulse so follow-up tasks settle quickly
pub fn test_config() -> Config {
    Config {
        pulse_duration_ms: 10,
        ..Config::default()
    }
}

/// Coordinator over `document` with deterministic rounding
pub fn new_coordinator<T: Translator + 'static>(
    document: &Arc<Mutex<MemoryDocument>>,
    translator: T,
    config: &Config,
) -> ProcessingCoordinator<MemoryDocument> {
    ProcessingCoordinator::new(Arc::clone(document), Arc::new(translator), config)
        .with_random_source(Box::new(FixedSource(0.5)))
}

/// Initialise logging once for tests that want to see coordinator output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

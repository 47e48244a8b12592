/*!
 * Common test utilities for the yastgen test suite
 */

use std::path::PathBuf;
use std::fs;
use anyhow::Result;
use tempfile::TempDir;

use yastgen::subtitle_track::{DEFAULT_STYLE, Event, Region};
use yastgen::timed_word::TimedWord;

// Re-export the mock providers module
pub mod mock_providers;

/// Route library logs to the test output; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Event in the default style
pub fn event(start: u64, end: u64, text: &str) -> Event {
    Event::new(start, end, text, DEFAULT_STYLE)
}

/// Event in a given style
pub fn styled_event(start: u64, end: u64, text: &str, style: &str) -> Event {
    Event::new(start, end, text, style)
}

/// Words laid out back to back over `[start, end)`, one slot each
pub fn words_over(start: u64, end: u64, texts: &[&str]) -> Vec<TimedWord> {
    let slot = (end - start) / texts.len() as u64;
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let word_start = start + slot * i as u64;
            let word_end = if i + 1 == texts.len() { end } else { word_start + slot };
            TimedWord::new(word_start, word_end, *text)
        })
        .collect()
}

/// Total time covered by a list of spans, overlaps counted once
pub fn covered_ms(spans: &[Region]) -> u64 {
    let mut sorted: Vec<Region> = spans.to_vec();
    sorted.sort_by_key(|r| r.start);

    let mut total = 0;
    let mut current: Option<Region> = None;
    for span in sorted {
        current = match current {
            Some(cur) if span.start <= cur.end => Some(Region::new(cur.start, cur.end.max(span.end))),
            Some(cur) => {
                total += cur.duration();
                Some(span)
            }
            None => Some(span),
        };
    }
    total + current.map_or(0, |r| r.duration())
}

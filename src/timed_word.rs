use serde::{Deserialize, Serialize};

// @module: Word-level timestamps from ASR or caption sources

/// Reading speed assumed for words with no duration, in chars per second
pub const DEFAULT_WORD_SPEED: f64 = 15.0;

// @struct: Single recognized word with its time span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedWord {
    // @field: Start time in ms
    pub start: u64,

    // @field: End time in ms
    pub end: u64,

    // @field: Recognized text
    pub text: String,
}

impl TimedWord {
    pub fn new(start: u64, end: u64, text: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            text: text.into(),
        }
    }

    /// Duration in milliseconds
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Characters per second
    pub fn speed(&self) -> f64 {
        match self.duration() {
            0 => DEFAULT_WORD_SPEED,
            duration => self.char_len() as f64 * 1000.0 / duration as f64,
        }
    }

    /// Split a token that actually holds several space-separated words.
    ///
    /// Each sub-word gets a share of the span proportional to its character
    /// length, i.e. the token's speed applied per sub-word. The last
    /// sub-word ends exactly at the original end so the total span is kept.
    pub fn split(&self) -> Vec<TimedWord> {
        let parts: Vec<&str> = self.text.split_whitespace().collect();
        if parts.len() <= 1 {
            return vec![self.clone()];
        }

        let total_chars: u64 = parts.iter().map(|p| p.chars().count() as u64).sum();
        let span = self.duration();

        let mut words = Vec::with_capacity(parts.len());
        let mut consumed_chars = 0u64;
        let mut cursor = self.start;
        for (i, part) in parts.iter().enumerate() {
            consumed_chars += part.chars().count() as u64;
            let end = if i + 1 == parts.len() {
                self.end
            } else {
                self.start + span * consumed_chars / total_chars
            };
            words.push(TimedWord::new(cursor, end, *part));
            cursor = end;
        }
        words
    }
}

/// Flatten a word list, splitting every grouped token
pub fn split_all(words: &[TimedWord]) -> Vec<TimedWord> {
    words.iter().flat_map(TimedWord::split).collect()
}

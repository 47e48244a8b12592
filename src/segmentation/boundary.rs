/*!
 * Split point selection for oversized subtitle text.
 *
 * Text is only ever cut at natural break points. Candidates are tried in a
 * fixed order of strategies: punctuation delimiters first, then strong
 * stop-words, then weak stop-words. Within one strategy the candidate
 * closest to the middle of the text wins, provided it is not too close to
 * either edge. When no strategy yields a candidate the text stays whole.
 *
 * All positions are character offsets, not byte offsets.
 */

use std::collections::HashSet;
use std::ops::Range;

use log::trace;

use crate::app_config::SegmentationConfig;

/// Set of tokens accepted as split points for one strategy
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: HashSet<String>,
}

impl TokenSet {
    /// One token per character, used for punctuation delimiters
    pub fn from_chars(chars: &str) -> Self {
        Self {
            tokens: chars.chars().map(|c| c.to_string()).collect(),
        }
    }

    /// Lower-cased word tokens, used for stop-word lists
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            tokens: words
                .iter()
                .map(|w| normalize_token(w.as_ref()))
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Outcome of a split search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDecision {
    /// Cut the text before this character offset
    Split(usize),
    /// No acceptable split point
    NoSplit,
}

/// Split point strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Delimiters,
    StrongStopWords,
    WeakStopWords,
}

impl SplitStrategy {
    pub const FALLBACK_ORDER: [SplitStrategy; 3] = [
        SplitStrategy::Delimiters,
        SplitStrategy::StrongStopWords,
        SplitStrategy::WeakStopWords,
    ];
}

/// Token sets and limits built once from a `SegmentationConfig`
#[derive(Debug, Clone)]
pub struct SplitRules {
    pub delimiters: TokenSet,
    pub strong_stop_words: TokenSet,
    pub weak_stop_words: TokenSet,
    pub min_edge_ratio: f64,
    pub max_len: usize,
}

impl SplitRules {
    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self {
            delimiters: TokenSet::from_chars(&config.delimiters),
            strong_stop_words: TokenSet::from_words(&config.strong_stop_words),
            weak_stop_words: TokenSet::from_words(&config.weak_stop_words),
            min_edge_ratio: config.min_edge_ratio,
            max_len: config.max_join_size,
        }
    }

    pub fn tokens_for(&self, strategy: SplitStrategy) -> &TokenSet {
        match strategy {
            SplitStrategy::Delimiters => &self.delimiters,
            SplitStrategy::StrongStopWords => &self.strong_stop_words,
            SplitStrategy::WeakStopWords => &self.weak_stop_words,
        }
    }

    /// Whether a character is one of the configured delimiters
    pub fn is_delimiter(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.delimiters.contains(c.encode_utf8(&mut buf))
    }
}

/// Pick the preferred candidate closest to the midpoint of the text.
///
/// Candidates outside `[min_edge_ratio * L, (1 - min_edge_ratio) * L]` or at
/// the very edges are ignored. Ties go to the first candidate encountered.
pub fn find_split_position(
    total_length: usize,
    candidates: &[(usize, &str)],
    preferred: &TokenSet,
    min_edge_ratio: f64,
) -> SplitDecision {
    if total_length < 2 || preferred.is_empty() {
        return SplitDecision::NoSplit;
    }

    let length = total_length as f64;
    let lower = min_edge_ratio * length;
    let upper = (1.0 - min_edge_ratio) * length;
    let midpoint = length / 2.0;

    let mut best: Option<(usize, f64)> = None;
    for &(pos, token) in candidates {
        if pos == 0 || pos >= total_length {
            continue;
        }
        let at = pos as f64;
        if at < lower || at > upper || !preferred.contains(token) {
            continue;
        }
        let distance = (at - midpoint).abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((pos, distance));
        }
    }

    match best {
        Some((pos, _)) => SplitDecision::Split(pos),
        None => SplitDecision::NoSplit,
    }
}

/// Positions just after each delimiter character, with the delimiter itself
pub fn slice_position_map<'a>(text: &'a str, delimiters: &TokenSet) -> Vec<(usize, &'a str)> {
    text.char_indices()
        .enumerate()
        .filter_map(|(char_pos, (byte_pos, c))| {
            let token = &text[byte_pos..byte_pos + c.len_utf8()];
            delimiters.contains(token).then_some((char_pos + 1, token))
        })
        .collect()
}

/// Character offset where each whitespace-separated word starts, with the normalized word
pub fn word_start_positions(text: &str) -> Vec<(usize, String)> {
    let mut positions = Vec::new();
    let mut in_word = false;
    let mut word_start = 0;
    let mut word = String::new();

    for (char_pos, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            if in_word {
                positions.push((word_start, normalize_token(&word)));
                word.clear();
                in_word = false;
            }
        } else {
            if !in_word {
                word_start = char_pos;
                in_word = true;
            }
            word.push(c);
        }
    }
    if in_word {
        positions.push((word_start, normalize_token(&word)));
    }
    positions
}

/// Lower-case a word and strip surrounding punctuation
pub fn normalize_token(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// Candidate split positions of a text for one strategy
fn candidates_for(text: &str, strategy: SplitStrategy, rules: &SplitRules) -> Vec<(usize, String)> {
    match strategy {
        SplitStrategy::Delimiters => slice_position_map(text, &rules.delimiters)
            .into_iter()
            .map(|(pos, token)| (pos, token.to_string()))
            .collect(),
        SplitStrategy::StrongStopWords | SplitStrategy::WeakStopWords => word_start_positions(text),
    }
}

/// Try every strategy in fallback order and return the first split found
pub fn choose_split(text: &str, rules: &SplitRules) -> SplitDecision {
    let total_length = text.chars().count();

    for strategy in SplitStrategy::FALLBACK_ORDER {
        let owned = candidates_for(text, strategy, rules);
        let candidates: Vec<(usize, &str)> = owned.iter().map(|(p, t)| (*p, t.as_str())).collect();
        let decision = find_split_position(
            total_length,
            &candidates,
            rules.tokens_for(strategy),
            rules.min_edge_ratio,
        );
        if let SplitDecision::Split(pos) = decision {
            trace!("Split {} chars at {} using {:?}", total_length, pos, strategy);
            return decision;
        }
    }

    SplitDecision::NoSplit
}

/// Byte offset of a character offset
pub fn byte_offset(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn split_recursive(text: &str, range: Range<usize>, rules: &SplitRules, out: &mut Vec<Range<usize>>) {
    let slice = &text[range.clone()];
    if char_len(slice) <= rules.max_len {
        out.push(range);
        return;
    }

    match choose_split(slice, rules) {
        SplitDecision::Split(pos) => {
            let cut = range.start + byte_offset(slice, pos);
            split_recursive(text, range.start..cut, rules, out);
            split_recursive(text, cut..range.end, rules, out);
        }
        SplitDecision::NoSplit => out.push(range),
    }
}

/// Re-join adjacent fragments whenever the joint fragment still fits
pub fn compact_fragments(text: &str, fragments: Vec<Range<usize>>, max_len: usize) -> Vec<Range<usize>> {
    let mut compacted: Vec<Range<usize>> = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        match compacted.last_mut() {
            Some(last) if last.end == fragment.start && char_len(&text[last.start..fragment.end]) <= max_len => {
                last.end = fragment.end;
            }
            _ => compacted.push(fragment),
        }
    }
    compacted
}

/// Split text until every fragment fits `rules.max_len` or has no split point left.
///
/// Fragments are raw substrings: concatenated they reproduce `text` exactly.
pub fn split_text<'a>(text: &'a str, rules: &SplitRules) -> Vec<&'a str> {
    let mut fragments = Vec::new();
    split_recursive(text, 0..text.len(), rules, &mut fragments);
    compact_fragments(text, fragments, rules.max_len)
        .into_iter()
        .map(|range| &text[range])
        .collect()
}

/*!
 * Binding of word-level timestamps to coarse subtitle events.
 *
 * Words and coarse events are walked in lock-step. A word belongs to the
 * current event while it starts before the event ends. Long events are cut
 * at a natural word boundary once their running text exceeds the maximum
 * size. The index of the last word of each produced event is recorded so the
 * caller can render event text from the word list.
 */

use log::{debug, warn};

use crate::app_config::SegmentationConfig;
use crate::errors::SegmentationError;
use crate::subtitle_track::{Event, Region, enforce_non_overlap};
use crate::timed_word::{TimedWord, split_all};

use super::boundary::{SplitDecision, SplitRules, SplitStrategy, find_split_position, normalize_token};

/// Duration given to a word that arrives with none
pub const DEFAULT_WORD_DURATION_MS: u64 = 200;

/// Result of binding words to events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordBinding {
    /// Event spans, sorted and non-overlapping
    pub regions: Vec<Region>,
    /// Index of the last word bound to each region
    pub last_word_index: Vec<usize>,
}

impl WordBinding {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Word index range of each region
    pub fn word_ranges(&self) -> impl Iterator<Item = std::ops::RangeInclusive<usize>> + '_ {
        let mut next_first = 0;
        self.last_word_index.iter().map(move |&last| {
            let range = next_first..=last;
            next_first = last + 1;
            range
        })
    }
}

/// Give a word without duration a default one, without running into the next word
fn repair_duration(words: &mut [TimedWord], i: usize) {
    if words[i].end > words[i].start {
        return;
    }
    let start = words[i].start;
    let mut end = start + DEFAULT_WORD_DURATION_MS;
    if let Some(next) = words.get(i + 1) {
        if next.start > start && next.start < end {
            end = next.start;
        }
    }
    words[i].end = end;
}

fn joined_len(words: &[TimedWord]) -> usize {
    let chars: usize = words.iter().map(TimedWord::char_len).sum();
    chars + words.len().saturating_sub(1)
}

/// Pick the word before which a run of words should be cut.
///
/// Returns an index into `words`, always at least 1.
fn find_word_split(words: &[TimedWord], rules: &SplitRules) -> Option<usize> {
    let mut offsets = Vec::with_capacity(words.len());
    let mut offset = 0;
    for word in words {
        offsets.push(offset);
        offset += word.char_len() + 1;
    }
    let total_length = joined_len(words);

    let normalized: Vec<String> = words.iter().map(|w| normalize_token(&w.text)).collect();
    let trailing: Vec<String> = words
        .iter()
        .map(|w| w.text.chars().last().map(|c| c.to_string()).unwrap_or_default())
        .collect();

    for strategy in SplitStrategy::FALLBACK_ORDER {
        let candidates: Vec<(usize, &str)> = (1..words.len())
            .map(|m| match strategy {
                SplitStrategy::Delimiters => (offsets[m], trailing[m - 1].as_str()),
                SplitStrategy::StrongStopWords | SplitStrategy::WeakStopWords => {
                    (offsets[m], normalized[m].as_str())
                }
            })
            .collect();

        let decision = find_split_position(
            total_length,
            &candidates,
            rules.tokens_for(strategy),
            rules.min_edge_ratio,
        );
        if let SplitDecision::Split(pos) = decision {
            return offsets.binary_search(&pos).ok();
        }
    }
    None
}

/// Bind words to coarse events, splitting events whose text grows too long.
///
/// Words are repaired in place: the first word of each event is snapped to
/// the event start and zero-length words get a default duration. Fails with
/// `AlignmentInsufficient` when the events run out before the words do.
pub fn bind_words(
    words: &mut [TimedWord],
    coarse: &[Region],
    config: &SegmentationConfig,
) -> Result<WordBinding, SegmentationError> {
    let mut binding = WordBinding::default();
    if words.is_empty() {
        return Ok(binding);
    }

    let total_words = words.len();
    let events = coarse.len();
    let insufficient = move |bound_words: usize| SegmentationError::AlignmentInsufficient {
        bound_words,
        total_words,
        events,
    };

    let rules = SplitRules::from_config(config);
    let mut event_index = 0;
    let mut span = *coarse.first().ok_or_else(|| insufficient(0))?;
    let mut bound_in_event = 0;
    let mut segment_start = 0;
    let mut text_len = 0;
    let mut i = 0;

    while i < words.len() {
        if words[i].start < span.end {
            if bound_in_event == 0 {
                words[i].start = span.start;
                repair_duration(words, i);
                segment_start = i;
                text_len = 0;
            }
            bound_in_event += 1;
            if text_len > 0 {
                text_len += 1;
            }
            text_len += words[i].char_len();

            if text_len > rules.max_len && !config.avoid_split {
                if let Some(offset) = find_word_split(&words[segment_start..=i], &rules) {
                    let k = segment_start + offset;
                    let cut = words[k].start;
                    if cut > span.start && cut < span.end {
                        binding.regions.push(Region::new(span.start, cut));
                        binding.last_word_index.push(k - 1);
                        span.start = cut;
                        segment_start = k;
                        text_len = joined_len(&words[k..=i]);
                    } else {
                        debug!("Rejected split at {} ms outside event {}-{}", cut, span.start, span.end);
                    }
                }
            }
            i += 1;
        } else {
            if bound_in_event > 0 {
                binding.regions.push(span);
                binding.last_word_index.push(i - 1);
            } else {
                debug!("Dropping empty event {}-{}", span.start, span.end);
            }
            event_index += 1;
            span = *coarse.get(event_index).ok_or_else(|| insufficient(i))?;
            bound_in_event = 0;
        }
    }

    if bound_in_event > 0 {
        binding.regions.push(span);
        binding.last_word_index.push(words.len() - 1);
    }

    Ok(binding)
}

/// Render events from a binding, joining each region's words.
///
/// An event is stretched to its last word's end when that does not reach
/// into the next event.
pub fn compose_events(
    words: &[TimedWord],
    binding: &WordBinding,
    config: &SegmentationConfig,
    style: &str,
) -> Vec<Event> {
    let mut events = Vec::with_capacity(binding.len());
    for (n, (region, range)) in binding.regions.iter().zip(binding.word_ranges()).enumerate() {
        let Some(bound) = words.get(range.clone()) else {
            warn!("Word range {:?} is outside the word list", range);
            continue;
        };
        let text = bound
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(&config.join_separator);

        let limit = binding.regions.get(n + 1).map_or(u64::MAX, |next| next.start);
        let last_end = bound.last().map_or(region.end, |w| w.end);
        let end = region.end.max(last_end.min(limit));

        events.push(Event::new(region.start, end, text, style));
    }
    enforce_non_overlap(&mut events);
    events
}

/// Split grouped tokens, bind them to coarse events and render the events
pub fn align_words(
    words: &[TimedWord],
    coarse: &[Region],
    config: &SegmentationConfig,
    style: &str,
) -> Result<Vec<Event>, SegmentationError> {
    let mut words = split_all(words);
    let binding = bind_words(&mut words, coarse, config)?;
    debug!(
        "Bound {} words to {} events from {} coarse events",
        words.len(),
        binding.len(),
        coarse.len()
    );
    Ok(compose_events(&words, &binding, config, style))
}

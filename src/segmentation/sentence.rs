/*!
 * Sentence-level merge and split of transcribed events.
 *
 * Adjacent events of one style are merged while the gap between them is
 * short, the left one does not already end a sentence and the joint text
 * fits the size limit. A joint text that does not fit is re-split at its
 * most natural break point instead, so sentences flow across recognizer
 * boundaries. Single events that are too long are split on their own.
 */

use log::{debug, info};

use crate::app_config::SegmentationConfig;
use crate::subtitle_track::{Event, enforce_non_overlap};

use super::boundary::{SplitRules, split_text};

/// Counts of merges and splits performed by one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentationStats {
    /// Events absorbed into a neighbour
    pub merged: usize,
    /// Extra events created by splitting
    pub split: usize,
}

impl std::ops::AddAssign for SegmentationStats {
    fn add_assign(&mut self, other: Self) {
        self.merged += other.merged;
        self.split += other.split;
    }
}

struct SentenceMerger<'a> {
    config: &'a SegmentationConfig,
    rules: SplitRules,
    stats: SegmentationStats,
}

impl<'a> SentenceMerger<'a> {
    fn new(config: &'a SegmentationConfig) -> Self {
        Self {
            config,
            rules: SplitRules::from_config(config),
            stats: SegmentationStats::default(),
        }
    }

    fn ends_sentence(&self, text: &str) -> bool {
        text.trim_end().chars().last().is_some_and(|c| self.rules.is_delimiter(c))
    }

    fn starts_with_delimiter(&self, text: &str) -> bool {
        text.trim_start().chars().next().is_some_and(|c| self.rules.is_delimiter(c))
    }

    fn join(&self, left: &Event, right: &Event) -> Event {
        let text = match (left.text.is_empty(), right.text.is_empty()) {
            (true, _) => right.text.clone(),
            (_, true) => left.text.clone(),
            _ => format!("{}{}{}", left.text, self.config.join_separator, right.text),
        };
        Event {
            start: left.start,
            end: left.end.max(right.end),
            text,
            ..left.clone()
        }
    }

    /// Split an event's text and share its span in proportion to fragment length
    fn split_event(&self, event: &Event) -> Vec<Event> {
        let fragments = split_text(&event.text, &self.rules);
        if fragments.len() < 2 {
            return vec![event.clone()];
        }

        let total_chars: u64 = fragments.iter().map(|f| f.chars().count() as u64).sum();
        let duration = event.duration();
        let mut consumed = 0u64;
        let mut cursor = event.start;
        let mut pieces = Vec::with_capacity(fragments.len());

        for (i, fragment) in fragments.iter().enumerate() {
            consumed += fragment.chars().count() as u64;
            let end = if i + 1 == fragments.len() {
                event.end
            } else {
                event.start + duration * consumed / total_chars.max(1)
            };
            let text = fragment.trim();
            if !text.is_empty() {
                pieces.push(Event {
                    start: cursor,
                    end,
                    text: text.to_string(),
                    ..event.clone()
                });
            }
            cursor = end;
        }
        pieces
    }

    fn flush(&mut self, event: Event, out: &mut Vec<Event>) {
        if !self.config.avoid_split && event.char_len() > self.rules.max_len {
            let pieces = self.split_event(&event);
            self.stats.split += pieces.len().saturating_sub(1);
            out.extend(pieces);
        } else {
            out.push(event);
        }
    }

    fn run(&mut self, events: Vec<Event>) -> Vec<Event> {
        let mut out = Vec::with_capacity(events.len());
        let mut current: Option<Event> = None;

        for event in events {
            let Some(cur) = current.take() else {
                current = Some(event);
                continue;
            };

            let gap = event.start.saturating_sub(cur.end);
            let joinable = gap < self.config.max_delta_time_ms
                && !self.ends_sentence(&cur.text)
                && !self.starts_with_delimiter(&event.text);
            if !joinable {
                self.flush(cur, &mut out);
                current = Some(event);
                continue;
            }

            let joint = self.join(&cur, &event);
            if joint.char_len() <= self.rules.max_len {
                self.stats.merged += 1;
                current = Some(joint);
                continue;
            }

            if !self.config.avoid_split {
                let mut pieces = self.split_event(&joint);
                if pieces.len() > 1 {
                    self.stats.merged += 1;
                    self.stats.split += pieces.len() - 1;
                    current = pieces.pop();
                    out.extend(pieces);
                    continue;
                }
            }

            self.flush(cur, &mut out);
            current = Some(event);
        }

        if let Some(cur) = current {
            self.flush(cur, &mut out);
        }
        enforce_non_overlap(&mut out);
        out
    }
}

/// Merge and split the events of every style group independently.
///
/// Comment events pass through untouched. The result is sorted by start time.
pub fn merge_and_split(events: &[Event], config: &SegmentationConfig) -> (Vec<Event>, SegmentationStats) {
    let mut styles: Vec<&str> = Vec::new();
    for event in events.iter().filter(|e| !e.is_comment) {
        if !styles.contains(&event.style.as_str()) {
            styles.push(&event.style);
        }
    }

    let mut output: Vec<Event> = events.iter().filter(|e| e.is_comment).cloned().collect();
    let mut stats = SegmentationStats::default();

    for style in styles {
        let mut group: Vec<Event> = events
            .iter()
            .filter(|e| !e.is_comment && e.style == style)
            .cloned()
            .collect();
        group.sort_by_key(|e| e.start);

        let before = group.len();
        let mut merger = SentenceMerger::new(config);
        let merged = merger.run(group);
        debug!("Style '{}': {} events in, {} events out", style, before, merged.len());

        stats += merger.stats;
        output.extend(merged);
    }

    output.sort_by_key(|e| e.start);
    info!("Sentence pass merged {} and split {} events", stats.merged, stats.split);
    (output, stats)
}

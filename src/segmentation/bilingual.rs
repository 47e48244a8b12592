/*!
 * Bilingual event merge and split.
 *
 * Two independently timed tracks of the same audio are combined into one.
 * Where an event of each track covers the same interval, a single event
 * carries both texts, the bottom text introduced by a line break and a style
 * reset tag. Where the tracks disagree on boundaries, the wider event is cut
 * at the narrower one's edges and the uncovered pieces stay single-language,
 * so no part of either track's time coverage is lost.
 */

use std::collections::VecDeque;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle_track::Event;

/// Hard line break inside an event
pub const LINE_BREAK: &str = "\\N";

/// `\N{\r<style>}` marker separating the two languages of a combined event
static STYLE_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\N\{\\r([^}]*)\}").unwrap()
});

/// How the current heads of the two tracks relate in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapCase {
    /// Top event ends before the bottom one starts
    DisjointBefore,
    /// Bottom event ends before the top one starts
    DisjointAfter,
    /// Same start and end
    ExactMatch,
    /// Overlap where the top event reaches further left
    LeftExtends,
    /// Overlap where the bottom event reaches further left, or both start together
    RightExtends,
}

/// Classify two events by their overlap
pub fn classify(top: &Event, bottom: &Event) -> OverlapCase {
    if top.end <= bottom.start {
        OverlapCase::DisjointBefore
    } else if bottom.end <= top.start {
        OverlapCase::DisjointAfter
    } else if top.start == bottom.start && top.end == bottom.end {
        OverlapCase::ExactMatch
    } else if top.start < bottom.start || (top.start == bottom.start && top.end > bottom.end) {
        OverlapCase::LeftExtends
    } else {
        OverlapCase::RightExtends
    }
}

/// Text of a combined event
pub fn combine_text(top: &Event, bottom: &Event) -> String {
    format!("{}{}{{\\r{}}}{}", top.text, LINE_BREAK, bottom.style, bottom.text)
}

fn combine(top: &Event, bottom: &Event, start: u64, end: u64) -> Event {
    Event {
        start,
        end,
        text: combine_text(top, bottom),
        style: top.style.clone(),
        is_comment: false,
    }
}

/// Sorted, non-overlapping, positive-duration copy of one input track.
///
/// Overlaps are resolved without losing coverage: a partly overlapping event
/// starts where its predecessor ends, and an event nested inside its
/// predecessor cuts it in two, the remainder queued again after the nested one.
fn normalize(events: &[Event]) -> VecDeque<Event> {
    let mut pending: VecDeque<Event> = events
        .iter()
        .filter(|e| !e.is_comment && e.end > e.start)
        .cloned()
        .collect();
    pending.make_contiguous().sort_by_key(|e| e.start);

    let mut normalized: VecDeque<Event> = VecDeque::with_capacity(pending.len());
    while let Some(mut event) = pending.pop_front() {
        let Some(last) = normalized.back_mut() else {
            normalized.push_back(event);
            continue;
        };
        if event.start >= last.end {
            normalized.push_back(event);
            continue;
        }

        // `last` may have been pushed forward; the time before its start is already covered
        if event.start < last.start {
            event.start = last.start;
            if event.end <= event.start {
                continue;
            }
        }

        if event.end > last.end {
            event.start = last.end;
            normalized.push_back(event);
            continue;
        }

        // Nested: keep the outer head, the nested event, then the outer tail
        let tail = (event.end < last.end).then(|| last.with_span(event.end, last.end));
        last.end = event.start;
        if last.end <= last.start {
            normalized.pop_back();
        }
        normalized.push_back(event);
        if let Some(tail) = tail {
            let at = pending.partition_point(|e| e.start <= tail.start);
            pending.insert(at, tail);
        }
    }

    debug!("Normalized {} input events into {}", events.len(), normalized.len());
    normalized
}

/// Combine two tracks into one bilingual track.
///
/// Combined events take the top event's style. Single-language fragments
/// keep their own style. The output is sorted and never overlaps.
pub fn merge_bilingual(top: &[Event], bottom: &[Event]) -> Vec<Event> {
    let mut tops = normalize(top);
    let mut bottoms = normalize(bottom);
    let mut combined = Vec::new();
    let mut events_0 = Vec::new();

    loop {
        let Some(a) = tops.pop_front() else {
            break;
        };
        let Some(b) = bottoms.pop_front() else {
            tops.push_front(a);
            break;
        };

        match classify(&a, &b) {
            OverlapCase::DisjointBefore => {
                events_0.push(a);
                bottoms.push_front(b);
            }
            OverlapCase::DisjointAfter => {
                events_0.push(b);
                tops.push_front(a);
            }
            OverlapCase::ExactMatch => {
                combined.push(combine(&a, &b, a.start, a.end));
            }
            OverlapCase::LeftExtends | OverlapCase::RightExtends => {
                let start = a.start.max(b.start);
                let end = a.end.min(b.end);

                for side in [&a, &b] {
                    if side.start < start {
                        events_0.push(side.with_span(side.start, start));
                    }
                }
                combined.push(combine(&a, &b, start, end));

                if a.end > end {
                    tops.push_front(a.with_span(end, a.end));
                }
                if b.end > end {
                    bottoms.push_front(b.with_span(end, b.end));
                }
            }
        }
    }

    events_0.extend(tops);
    events_0.extend(bottoms);
    debug!(
        "Bilingual merge: {} combined, {} single-language events",
        combined.len(),
        events_0.len()
    );

    let mut merged = combined;
    merged.extend(events_0);
    merged.sort_by_key(|e| e.start);
    merged
}

/// The two tracks recovered from a bilingual track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BilingualSplit {
    pub top: Vec<Event>,
    pub bottom: Vec<Event>,
}

/// Append an event, fusing it with the previous one when it continues the same text
fn push_coalesced(events: &mut Vec<Event>, event: Event) {
    if let Some(last) = events.last_mut() {
        if last.end == event.start && last.text == event.text && last.style == event.style {
            last.end = event.end;
            return;
        }
    }
    events.push(event);
}

/// Styles of the two lines, as recorded by the first combined event
fn marker_styles(events: &[Event]) -> Option<(String, String)> {
    events.iter().filter(|e| !e.is_comment).find_map(|event| {
        STYLE_MARKER_REGEX
            .captures(&event.text)
            .and_then(|caps| caps.get(1))
            .map(|bottom| (event.style.clone(), bottom.as_str().to_string()))
    })
}

/// Separate a bilingual track back into its two languages.
///
/// Combined events are cut at their style marker. The markers also tell
/// which style belongs on the bottom line; `fallback_bottom_style` is only
/// used for tracks without any combined event. Single-language events go to
/// the bottom track when they carry the bottom style, to the top otherwise.
/// Fragments of one source event that were cut apart by the merge are fused
/// back together.
pub fn split_bilingual(events: &[Event], fallback_bottom_style: &str) -> BilingualSplit {
    let (top_style, bottom_style) = match marker_styles(events) {
        Some((top, bottom)) => (Some(top), bottom),
        None => (None, fallback_bottom_style.to_string()),
    };
    // A track whose two lines share one style cannot be routed; keep plain events on top
    let routes_bottom = |style: &str| style == bottom_style && top_style.as_deref() != Some(style);

    let mut split = BilingualSplit::default();
    for event in events {
        if event.is_comment {
            split.top.push(event.clone());
            continue;
        }

        match STYLE_MARKER_REGEX.captures(&event.text) {
            Some(caps) => {
                let (Some(marker), Some(style)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let top_text = &event.text[..marker.start()];
                let bottom_text = &event.text[marker.end()..];
                push_coalesced(&mut split.top, Event {
                    text: top_text.to_string(),
                    ..event.clone()
                });
                push_coalesced(&mut split.bottom, Event {
                    text: bottom_text.to_string(),
                    style: style.as_str().to_string(),
                    ..event.clone()
                });
            }
            None if routes_bottom(&event.style) => push_coalesced(&mut split.bottom, event.clone()),
            None => push_coalesced(&mut split.top, event.clone()),
        }
    }

    split
}

/*!
 * Tightening of event bounds to the speech actually detected inside them.
 *
 * Each event's audio fragment is analysed again, and the sub-regions found
 * there are used to pull the event's start and end inward. Short leading or
 * trailing blips are treated as noise and trimmed past. Trimming only ever
 * narrows an event.
 */

use log::debug;

use crate::app_config::TrimConfig;
use crate::errors::SegmentationError;
use crate::subtitle_track::{Event, Region, enforce_non_overlap};

/// Narrow one event to its speech sub-regions.
///
/// `activity` holds sub-region times relative to `slice_start`, the position
/// of the analysed fragment in the full audio.
pub fn trim_event(event: &Event, activity: &[Region], slice_start: u64, trim_size_ms: u64) -> Event {
    if activity.is_empty() {
        return event.clone();
    }

    let mut absolute: Vec<Region> = activity
        .iter()
        .map(|r| Region::new(r.start + slice_start, r.end + slice_start))
        .collect();
    absolute.sort_by_key(|r| r.start);

    let first = absolute.iter().position(|r| r.duration() >= trim_size_ms);
    let last = absolute.iter().rposition(|r| r.duration() >= trim_size_ms);
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) => (absolute[first], absolute[last]),
        _ => (absolute[0], absolute[absolute.len() - 1]),
    };

    let start = first.start.clamp(event.start, event.end);
    let end = last.end.clamp(start, event.end);
    if end <= start {
        return event.clone();
    }

    if start != event.start || end != event.end {
        debug!("Trimmed event {}-{} to {}-{}", event.start, event.end, start, end);
    }
    event.with_span(start, end)
}

/// Narrow every event to the speech detected inside its fragment.
///
/// `activity[i]` holds the sub-regions of event `i`, relative to the start of
/// its extracted slice (`event.start - margin_before_ms`). Events without
/// activity keep their coarse bounds.
pub fn trim_events(
    events: &[Event],
    activity: &[Vec<Region>],
    config: &TrimConfig,
    margin_before_ms: u64,
) -> Result<Vec<Event>, SegmentationError> {
    if events.len() != activity.len() {
        return Err(SegmentationError::CountMismatch {
            what: "trim activity",
            expected: events.len(),
            actual: activity.len(),
        });
    }

    let mut trimmed: Vec<Event> = events
        .iter()
        .zip(activity)
        .map(|(event, regions)| {
            let slice_start = event.start.saturating_sub(margin_before_ms);
            trim_event(event, regions, slice_start, config.trim_size_ms)
        })
        .collect();
    enforce_non_overlap(&mut trimmed);
    Ok(trimmed)
}

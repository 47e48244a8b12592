/*!
 * Tests for the trim reconciler
 */

use yastgen::app_config::TrimConfig;
use yastgen::errors::SegmentationError;
use yastgen::segmentation::trim::trim_events;
use yastgen::subtitle_track::{Region, is_non_overlapping};
use crate::common::event;

fn trim_config(trim_size_ms: u64) -> TrimConfig {
    TrimConfig {
        enabled: true,
        trim_size_ms,
    }
}

/// A short leading blip is trimmed past, the trailing edge follows the last speech
#[test]
fn test_trim_events_withLeadingBlip_shouldStartAtRealSpeech() {
    let events = vec![event(0, 5000, "hello")];
    let activity = vec![vec![Region::new(200, 300), Region::new(1000, 4500)]];

    let trimmed = trim_events(&events, &activity, &trim_config(150), 0).expect("counts match");

    assert_eq!((trimmed[0].start, trimmed[0].end), (1000, 4500));
    assert_eq!(trimmed[0].text, "hello");
}

/// Silent fragments keep their coarse bounds
#[test]
fn test_trim_events_withSilentFragment_shouldLeaveEventAlone() {
    let events = vec![event(0, 5000, "hello"), event(6000, 7000, "again")];
    let activity = vec![vec![], vec![Region::new(100, 800)]];

    let trimmed = trim_events(&events, &activity, &trim_config(150), 0).expect("counts match");

    assert_eq!((trimmed[0].start, trimmed[0].end), (0, 5000));
    assert_eq!((trimmed[1].start, trimmed[1].end), (6100, 6800));
}

/// Sub-regions are relative to the slice, which starts before the event by the margin
#[test]
fn test_trim_events_withMargin_shouldOffsetActivity() {
    let events = vec![event(2000, 4000, "hello")];
    let activity = vec![vec![Region::new(700, 1800)]];

    let trimmed = trim_events(&events, &activity, &trim_config(150), 500).expect("counts match");

    assert_eq!((trimmed[0].start, trimmed[0].end), (2200, 3300));
}

/// Mismatched lists are an error, not a silent truncation
#[test]
fn test_trim_events_withCountMismatch_shouldFail() {
    let events = vec![event(0, 1000, "a"), event(1000, 2000, "b")];
    let result = trim_events(&events, &[vec![]], &trim_config(150), 0);

    assert_eq!(
        result,
        Err(SegmentationError::CountMismatch {
            what: "trim activity",
            expected: 2,
            actual: 1,
        })
    );
}

/// The final pass removes overlaps left by the input
#[test]
fn test_trim_events_withOverlappingInput_shouldNotOverlap() {
    let events = vec![event(0, 2000, "a"), event(1500, 3000, "b")];
    let trimmed = trim_events(&events, &[vec![], vec![]], &trim_config(150), 0).expect("counts match");

    assert!(is_non_overlapping(&trimmed));
    assert_eq!((trimmed[0].start, trimmed[0].end), (0, 1500));
}

/*!
 * Tests for the sentence merge and split engine
 */

use yastgen::app_config::SegmentationConfig;
use yastgen::segmentation::boundary::{SplitRules, split_text};
use yastgen::segmentation::sentence::merge_and_split;
use yastgen::subtitle_track::{Event, is_non_overlapping};
use crate::common::{self, event, styled_event};

fn config(max_join_size: usize, max_delta_time_ms: u64) -> SegmentationConfig {
    SegmentationConfig {
        max_join_size,
        max_delta_time_ms,
        ..SegmentationConfig::default()
    }
}

fn texts(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.text.as_str()).collect()
}

/// Close events without terminal punctuation merge into one
#[test]
fn test_merge_and_split_withOpenSentence_shouldMergeNeighbours() {
    common::init_logging();
    let events = vec![
        event(0, 2000, "Greetings."),
        event(2000, 5000, "Hello there"),
        event(5000, 6000, "General Kenobi"),
    ];

    let (merged, stats) = merge_and_split(&events, &config(40, 500));

    assert_eq!(texts(&merged), vec!["Greetings.", "Hello there General Kenobi"]);
    assert_eq!((merged[1].start, merged[1].end), (2000, 6000));
    assert_eq!(stats.merged, 1);
    assert_eq!(stats.split, 0);
}

/// A left text ending with a delimiter blocks the merge
#[test]
fn test_merge_and_split_withTerminatedSentence_shouldNotMerge() {
    let events = vec![event(2000, 5000, "Hello there."), event(5000, 6000, "General Kenobi.")];

    let (merged, stats) = merge_and_split(&events, &config(40, 500));

    assert_eq!(merged, events);
    assert_eq!(stats.merged, 0);
}

/// Events further apart than the allowed gap stay separate
#[test]
fn test_merge_and_split_withLargeGap_shouldNotMerge() {
    let events = vec![event(0, 1000, "so we went"), event(2000, 3000, "to the shop")];
    let (merged, _) = merge_and_split(&events, &config(40, 500));
    assert_eq!(merged.len(), 2);
}

/// A 90-character event is cut at its comma, not at the midpoint
#[test]
fn test_merge_and_split_withLongSentence_shouldSplitAtComma() {
    let first = format!("{},", "abcd ".repeat(7) + "abcd");
    let second = " efgh".repeat(10);
    let text = format!("{}{}", first, second);
    assert_eq!(text.chars().count(), 90);

    let (events, stats) = merge_and_split(&[event(0, 9000, &text)], &config(50, 1000));

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].text, first);
    assert_eq!(events[0].char_len(), 40);
    assert_eq!(events[1].text, second.trim());
    assert_eq!(events[1].char_len(), 49);
    assert_eq!((events[0].start, events[0].end), (0, 4000));
    assert_eq!((events[1].start, events[1].end), (4000, 9000));
    assert_eq!(stats.split, 1);
}

/// A joint text that is too long is re-split at its best break point
#[test]
fn test_merge_and_split_withOversizedJoint_shouldResplitAcrossEvents() {
    let events = vec![
        event(0, 3000, "first part of the story, which goes on"),
        event(3000, 6000, "and on until the very end of it all"),
    ];

    let (result, stats) = merge_and_split(&events, &config(50, 1000));

    assert_eq!(
        texts(&result),
        vec!["first part of the story,", "which goes on and on until the very end of it all"]
    );
    assert_eq!(result[0].start, 0);
    assert_eq!(result[0].end, result[1].start);
    assert_eq!(result[1].end, 6000);
    assert!(result.iter().all(|e| e.char_len() <= 50));
    assert_eq!(stats.merged, 1);
    assert_eq!(stats.split, 1);
}

/// Text with no break point at any tier is left whole
#[test]
fn test_merge_and_split_withRunOnText_shouldKeepItWhole() {
    let run_on = "x".repeat(120);
    let (events, stats) = merge_and_split(&[event(0, 5000, &run_on)], &config(50, 1000));

    assert_eq!(texts(&events), vec![run_on.as_str()]);
    assert_eq!(stats.split, 0);
}

/// Re-merging split fragments restores the original text byte for byte
#[test]
fn test_merge_and_split_withSplitFragments_shouldRoundTrip() {
    let text = "we walked down to the river and we sat there for hours";
    let rules = SplitRules::from_config(&config(40, 1000));
    let fragments = split_text(text, &rules);
    assert_eq!(fragments, vec!["we walked down to the river ", "and we sat there for hours"]);

    let events = vec![event(0, 2000, fragments[0]), event(2000, 4000, fragments[1])];
    let merge_config = SegmentationConfig {
        join_separator: String::new(),
        ..config(100, 1000)
    };
    let (merged, _) = merge_and_split(&events, &merge_config);

    assert_eq!(texts(&merged), vec![text]);
}

/// Style groups are processed independently and comments pass through
#[test]
fn test_merge_and_split_withStylesAndComments_shouldKeepGroupsApart() {
    let mut comment = event(500, 700, "note");
    comment.is_comment = true;
    let events = vec![
        event(0, 1000, "one"),
        styled_event(0, 1000, "uno", "Translated"),
        comment.clone(),
        event(1000, 2000, "two"),
        styled_event(1000, 2000, "dos", "Translated"),
    ];

    let (result, stats) = merge_and_split(&events, &config(40, 500));

    assert_eq!(stats.merged, 2);
    assert!(result.contains(&comment));
    assert!(result.contains(&event(0, 2000, "one two")));
    assert!(result.contains(&styled_event(0, 2000, "uno dos", "Translated")));
}

/// Output never overlaps, even when the input does
#[test]
fn test_merge_and_split_withOverlappingInput_shouldNotOverlap() {
    let events = vec![
        event(0, 1500, "This is done."),
        event(1000, 2500, "And this too."),
        event(2400, 4000, "Finally."),
    ];
    let (result, _) = merge_and_split(&events, &config(40, 1000));

    assert_eq!(result.len(), 3);
    assert!(is_non_overlapping(&result));
}

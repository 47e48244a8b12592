/*!
 * Chained segmentation engines, as a caller without audio would use them
 */

use yastgen::app_config::{Config, TrimConfig};
use yastgen::segmentation::{align_words, merge_and_split, merge_bilingual, split_bilingual, trim_events};
use yastgen::subtitle_track::{
    DEFAULT_STYLE, Event, JsonTrackSerializer, Region, SubtitleSerializer, SubtitleTrack, is_non_overlapping,
};
use crate::common;

/// Words become events, events become sentences, sentences become a bilingual track and back
#[test]
fn test_workflow_withWordsAndTranslation_shouldRoundTripThroughBilingualTrack() {
    common::init_logging();
    let config = Config::default();

    let mut words = common::words_over(0, 2000, &["Hello", "there"]);
    words.extend(common::words_over(2000, 5000, &["my", "good", "friend"]));
    words.extend(common::words_over(5000, 6000, &["goodbye", "again"]));
    let regions = vec![Region::new(0, 2000), Region::new(2000, 5000), Region::new(5000, 6000)];

    let aligned = align_words(&words, &regions, &config.segmentation, DEFAULT_STYLE).expect("alignment");
    assert_eq!(aligned.len(), 3);

    let (sentences, stats) = merge_and_split(&aligned, &config.segmentation);
    assert_eq!(sentences.len(), 1);
    assert_eq!(stats.merged, 2);
    assert_eq!(sentences[0].text, "Hello there my good friend goodbye again");
    assert_eq!((sentences[0].start, sentences[0].end), (0, 6000));

    let translated = vec![Event::new(0, 6000, "Bonjour mon ami, au revoir", "Translated")];
    let bilingual = merge_bilingual(&sentences, &translated);
    assert_eq!(bilingual.len(), 1);
    assert!(bilingual[0].text.contains("\\N{\\rTranslated}"));

    let split = split_bilingual(&bilingual, "Translated");
    assert_eq!(split.top, sentences);
    assert_eq!(split.bottom, translated);
}

/// A track survives a trip through the JSON serializer and a file on disk
#[test]
fn test_workflow_withJsonSerializer_shouldRestoreTrackFromFile() -> anyhow::Result<()> {
    let config = Config::default();
    let events = vec![
        common::event(0, 1500, "First line."),
        common::event(1500, 4000, "Second line."),
        common::styled_event(500, 3000, "Deuxième ligne.", "Translated"),
    ];
    let mut track = SubtitleTrack::with_styles(config.styles.iter().cloned());
    track.push_events(events)?;
    track.sort_events();
    track.info.insert("output".to_string(), "source".to_string());

    let bytes = JsonTrackSerializer.serialize(&track, "json")?;
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(&dir.path().to_path_buf(), "track.json", &String::from_utf8(bytes)?)?;

    let restored: SubtitleTrack = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(restored, track);
    assert_eq!(restored.events_of_style("Translated").count(), 1);

    assert!(JsonTrackSerializer.serialize(&track, "srt").is_err());
    Ok(())
}

/// Trimming before segmentation keeps the merge pass working on tight bounds
#[test]
fn test_workflow_withTrimBeforeSegmentation_shouldMergeTrimmedEvents() {
    let config = Config::default();
    let coarse = vec![common::event(0, 3000, "we walked"), common::event(3000, 6000, "to the river")];
    let activity = vec![vec![Region::new(500, 2200)], vec![Region::new(100, 2500)]];
    let trim = TrimConfig {
        enabled: true,
        trim_size_ms: 200,
    };

    let trimmed = trim_events(&coarse, &activity, &trim, 0).expect("counts match");
    assert_eq!((trimmed[0].start, trimmed[0].end), (500, 2200));
    assert_eq!((trimmed[1].start, trimmed[1].end), (3100, 5500));

    let (sentences, _) = merge_and_split(&trimmed, &config.segmentation);
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].text, "we walked to the river");
    assert_eq!((sentences[0].start, sentences[0].end), (500, 5500));
    assert!(is_non_overlapping(&sentences));
}

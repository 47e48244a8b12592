use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ProviderError};

// @module: In-memory subtitle model shared by every engine

/// Name of the style used when nothing else is configured
pub const DEFAULT_STYLE: &str = "Default";

// @struct: Raw time interval believed to contain speech
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    // @field: Start time in ms
    pub start: u64,

    // @field: End time in ms
    pub end: u64,
}

impl Region {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

impl From<(u64, u64)> for Region {
    fn from((start, end): (u64, u64)) -> Self {
        Region::new(start, end)
    }
}

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    // @field: Start time in ms
    pub start: u64,

    // @field: End time in ms
    pub end: u64,

    // @field: Subtitle text
    #[serde(default)]
    pub text: String,

    // @field: Style name, resolved against the track style table
    #[serde(default = "default_style_name")]
    pub style: String,

    // @field: Comment events are carried but never merged or split
    #[serde(default)]
    pub is_comment: bool,
}

fn default_style_name() -> String {
    DEFAULT_STYLE.to_string()
}

impl Event {
    pub fn new(start: u64, end: u64, text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            text: text.into(),
            style: style.into(),
            is_comment: false,
        }
    }

    /// Event without text spanning a region
    pub fn from_region(region: Region, style: impl Into<String>) -> Self {
        Self::new(region.start, region.end, String::new(), style)
    }

    pub fn region(&self) -> Region {
        Region::new(self.start, self.end)
    }

    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Text length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Copy of this event restricted to another time span
    pub fn with_span(&self, start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
            ..self.clone()
        }
    }

    /// Format a timestamp in milliseconds as HH:MM:SS.mmm
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} --> {}] ({}) {}",
            Self::format_timestamp(self.start),
            Self::format_timestamp(self.end),
            self.style,
            self.text
        )
    }
}

/// Style attributes, keyed by name in the track style table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    #[serde(default = "default_font_name")]
    pub font_name: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// ASS colour in &HAABBGGRR notation
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    /// Numpad alignment (2 = bottom centre)
    #[serde(default = "default_alignment")]
    pub alignment: u8,
    #[serde(default = "default_margin_v")]
    pub margin_v: u32,
}

impl Style {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            font_name: default_font_name(),
            font_size: default_font_size(),
            primary_colour: default_primary_colour(),
            bold: false,
            italic: false,
            alignment: default_alignment(),
            margin_v: default_margin_v(),
        }
    }
}

fn default_font_name() -> String {
    "Arial".to_string()
}

fn default_font_size() -> f32 {
    20.0
}

fn default_primary_colour() -> String {
    "&H00FFFFFF".to_string()
}

fn default_alignment() -> u8 {
    2
}

fn default_margin_v() -> u32 {
    10
}

/// Which subtitle tracks the caller wants out of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Bare speech regions without text
    Regions,
    /// Source-language events
    Source,
    /// Destination-language events
    Destination,
    /// Bilingual events, source text on the top line
    SourceOverDestination,
    /// Bilingual events, destination text on the top line
    DestinationOverSource,
}

impl OutputKind {
    /// Whether producing this output requires a translation pass
    pub fn needs_translation(&self) -> bool {
        matches!(
            self,
            Self::Destination | Self::SourceOverDestination | Self::DestinationOverSource
        )
    }

    /// Whether producing this output requires transcription
    pub fn needs_transcription(&self) -> bool {
        !matches!(self, Self::Regions)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Regions => "regions",
            Self::Source => "source",
            Self::Destination => "destination",
            Self::SourceOverDestination => "source-over-destination",
            Self::DestinationOverSource => "destination-over-source",
        };
        write!(f, "{}", name)
    }
}

/// Ordered event list with its style table and info block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Events, sorted by start time within each style group
    #[serde(default)]
    pub events: Vec<Event>,

    /// Style table keyed by name
    #[serde(default)]
    pub styles: BTreeMap<String, Style>,

    /// Free-form metadata
    #[serde(default)]
    pub info: BTreeMap<String, String>,
}

impl SubtitleTrack {
    /// Track with the given styles and no events
    pub fn with_styles<I: IntoIterator<Item = Style>>(styles: I) -> Self {
        Self {
            events: Vec::new(),
            styles: styles.into_iter().map(|s| (s.name.clone(), s)).collect(),
            info: BTreeMap::new(),
        }
    }

    /// Look up a style by name
    pub fn resolve_style(&self, name: &str) -> Result<&Style, ConfigError> {
        self.styles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownStyle(name.to_string()))
    }

    /// Append events after checking that their styles exist
    pub fn push_events<I: IntoIterator<Item = Event>>(&mut self, events: I) -> Result<(), ConfigError> {
        for event in events {
            self.resolve_style(&event.style)?;
            self.events.push(event);
        }
        Ok(())
    }

    /// Stable sort by start time, so events of equal start keep insertion order
    pub fn sort_events(&mut self) {
        self.events.sort_by_key(|e| e.start);
    }

    /// Merge another track into this one, keeping both style tables
    pub fn absorb(&mut self, other: SubtitleTrack) {
        for (name, style) in other.styles {
            self.styles.entry(name).or_insert(style);
        }
        self.events.extend(other.events);
        self.sort_events();
    }

    /// Events of one style, in track order
    pub fn events_of_style<'a>(&'a self, style: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.style == style)
    }
}

/// Clamp a sorted event list so that no event overlaps its neighbours.
///
/// Single forward pass: each start is pushed to the previous end, each end is
/// pulled back to the next start, and an end never precedes its start.
pub fn enforce_non_overlap(events: &mut [Event]) {
    let n = events.len();
    for i in 0..n {
        if i > 0 {
            let prev_end = events[i - 1].end;
            if events[i].start < prev_end {
                events[i].start = prev_end;
            }
        }
        if i + 1 < n {
            let next_start = events[i + 1].start;
            if events[i].end > next_start {
                events[i].end = next_start;
            }
        }
        if events[i].end < events[i].start {
            events[i].end = events[i].start;
        }
    }
}

/// Check the non-overlap invariant
pub fn is_non_overlapping(events: &[Event]) -> bool {
    events
        .windows(2)
        .all(|pair| pair[0].end <= pair[1].start && pair[0].start <= pair[0].end)
}

/// Wire-format writer for finished tracks.
///
/// The engines never format bytes themselves; callers hand finished tracks to
/// an implementation of this trait.
pub trait SubtitleSerializer: Send + Sync {
    fn serialize(&self, track: &SubtitleTrack, format: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Serializer writing the in-memory model as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTrackSerializer;

impl SubtitleSerializer for JsonTrackSerializer {
    fn serialize(&self, track: &SubtitleTrack, format: &str) -> Result<Vec<u8>, ProviderError> {
        if !format.eq_ignore_ascii_case("json") {
            return Err(ProviderError::RequestFailed(format!(
                "JSON serializer cannot write format '{}'",
                format
            )));
        }
        serde_json::to_vec_pretty(track).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

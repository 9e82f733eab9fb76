//! Whole difficulty files.
//!
//! The current format is the v2 layout (`_version: "2.0.0"`). The older 1.5
//! layout carries the tempo header inline and has no bookmarks; its entity
//! arrays are identical, so both parse through [`WireBeatmap`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{
    events_from_wire, events_to_wire, notes_from_wire, notes_to_wire, obstacles_from_wire,
    obstacles_to_wire, WireBookmark, WireEvent, WireNote, WireObstacle,
};
use crate::entity::{compare_notes, Bookmark, BookmarkMap, EventTracks, Note, Obstacle, BOOKMARK_PALETTE};
use crate::mapping::{notes_from_wire_grid, notes_to_wire_grid, MappingExtensionsSettings};
use crate::Result;

pub const BEATMAP_VERSION: &str = "2.0.0";
pub const LEGACY_BEATMAP_VERSION: &str = "1.5.0";

const LEGACY_BEATS_PER_BAR: u32 = 16;
const LEGACY_SHUFFLE_PERIOD: f64 = 0.5;

fn default_version() -> String {
    BEATMAP_VERSION.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireCustomData {
    #[serde(rename = "_time", default)]
    pub time: f64,
    #[serde(rename = "_bookmarks", default)]
    pub bookmarks: Vec<WireBookmark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireBeatmap {
    #[serde(rename = "_version", default = "default_version")]
    pub version: String,
    #[serde(rename = "_notes", default)]
    pub notes: Vec<WireNote>,
    #[serde(rename = "_obstacles", default)]
    pub obstacles: Vec<WireObstacle>,
    #[serde(rename = "_events", default)]
    pub events: Vec<WireEvent>,
    #[serde(rename = "_customData", default)]
    pub custom_data: WireCustomData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBeatmap {
    #[serde(rename = "_version")]
    pub version: String,
    #[serde(rename = "_beatsPerMinute")]
    pub beats_per_minute: f64,
    #[serde(rename = "_beatsPerBar")]
    pub beats_per_bar: u32,
    #[serde(rename = "_noteJumpSpeed")]
    pub note_jump_speed: f64,
    #[serde(rename = "_shuffle")]
    pub shuffle: f64,
    #[serde(rename = "_shufflePeriod")]
    pub shuffle_period: f64,
    #[serde(rename = "_time")]
    pub time: f64,
    #[serde(rename = "_notes")]
    pub notes: Vec<WireNote>,
    #[serde(rename = "_obstacles")]
    pub obstacles: Vec<WireObstacle>,
    #[serde(rename = "_events")]
    pub events: Vec<WireEvent>,
}

/// Tempo header the legacy layout repeats in every difficulty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyHeader {
    pub bpm: f64,
    pub note_jump_speed: f64,
}

/// A decoded difficulty. Times are still in wire beats, before any offset
/// is removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Beatmap {
    pub notes: Vec<Note>,
    pub obstacles: Vec<Obstacle>,
    pub events: EventTracks,
    pub bookmarks: BookmarkMap,
}

fn active(mods: Option<&MappingExtensionsSettings>) -> Option<&MappingExtensionsSettings> {
    mods.filter(|settings| settings.is_enabled)
}

pub fn decode_beatmap(bytes: &[u8], mods: Option<&MappingExtensionsSettings>) -> Result<Beatmap> {
    let wire: WireBeatmap = serde_json::from_slice(bytes)?;
    debug!(
        version = %wire.version,
        notes = wire.notes.len(),
        obstacles = wire.obstacles.len(),
        events = wire.events.len(),
        "parsed beatmap"
    );

    let mut notes = notes_from_wire(&wire.notes)?;
    if let Some(settings) = active(mods) {
        notes = notes_from_wire_grid(notes, settings);
        notes.sort_by(compare_notes);
    }

    let bookmarks = wire
        .custom_data
        .bookmarks
        .into_iter()
        .enumerate()
        .map(|(index, bookmark)| Bookmark {
            beat_num: bookmark.time,
            name: bookmark.name,
            color: bookmark
                .color
                .unwrap_or_else(|| BOOKMARK_PALETTE[index % BOOKMARK_PALETTE.len()].to_string()),
        })
        .collect();

    Ok(Beatmap {
        notes,
        obstacles: obstacles_from_wire(&wire.obstacles)?,
        events: events_from_wire(&wire.events)?,
        bookmarks,
    })
}

fn wire_notes(map: &Beatmap, mods: Option<&MappingExtensionsSettings>) -> Vec<WireNote> {
    match active(mods) {
        Some(settings) => notes_to_wire(&notes_to_wire_grid(map.notes.clone(), settings)),
        None => notes_to_wire(&map.notes),
    }
}

pub fn encode_beatmap(map: &Beatmap, mods: Option<&MappingExtensionsSettings>) -> Result<Vec<u8>> {
    let wire = WireBeatmap {
        version: default_version(),
        notes: wire_notes(map, mods),
        obstacles: obstacles_to_wire(&map.obstacles),
        events: events_to_wire(&map.events),
        custom_data: WireCustomData {
            time: 0.0,
            bookmarks: map
                .bookmarks
                .iter()
                .map(|bookmark| WireBookmark {
                    time: bookmark.beat_num,
                    name: bookmark.name.clone(),
                    color: Some(bookmark.color.clone()),
                })
                .collect(),
        },
    };
    Ok(serde_json::to_vec(&wire)?)
}

/// Encodes the 1.5 layout. Bookmarks have no place in it and are dropped.
pub fn encode_legacy_beatmap(
    map: &Beatmap,
    mods: Option<&MappingExtensionsSettings>,
    header: LegacyHeader,
) -> Result<Vec<u8>> {
    let legacy = LegacyBeatmap {
        version: LEGACY_BEATMAP_VERSION.to_string(),
        beats_per_minute: header.bpm,
        beats_per_bar: LEGACY_BEATS_PER_BAR,
        note_jump_speed: header.note_jump_speed,
        shuffle: 0.0,
        shuffle_period: LEGACY_SHUFFLE_PERIOD,
        time: 0.0,
        notes: wire_notes(map, mods),
        obstacles: obstacles_to_wire(&map.obstacles),
        events: events_to_wire(&map.events),
    };
    Ok(serde_json::to_vec(&legacy)?)
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::offset::Timed;

use super::new_id;

/// The semantic family a track belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    Lighting,
    Ring,
    LaserSpeed,
}

/// Every event track the editor understands. The discriminant is the wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrackId {
    LaserBack = 0,
    TrackNeons = 1,
    LaserLeft = 2,
    LaserRight = 3,
    PrimaryLight = 4,
    LargeRing = 8,
    SmallRing = 9,
    LaserSpeedLeft = 12,
    LaserSpeedRight = 13,
}

impl TrackId {
    pub const ALL: [TrackId; 9] = [
        TrackId::LaserBack,
        TrackId::TrackNeons,
        TrackId::LaserLeft,
        TrackId::LaserRight,
        TrackId::PrimaryLight,
        TrackId::LargeRing,
        TrackId::SmallRing,
        TrackId::LaserSpeedLeft,
        TrackId::LaserSpeedRight,
    ];

    pub fn from_wire(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|track| track.wire_id() == value)
    }

    pub fn wire_id(self) -> i64 {
        self as i64
    }

    pub fn kind(self) -> TrackKind {
        match self {
            Self::LaserBack
            | Self::TrackNeons
            | Self::LaserLeft
            | Self::LaserRight
            | Self::PrimaryLight => TrackKind::Lighting,
            Self::LargeRing | Self::SmallRing => TrackKind::Ring,
            Self::LaserSpeedLeft | Self::LaserSpeedRight => TrackKind::LaserSpeed,
        }
    }

    /// The paired track a lock can mirror onto, if any.
    pub fn mirror(self) -> Option<Self> {
        match self {
            Self::LaserLeft => Some(Self::LaserRight),
            Self::LaserRight => Some(Self::LaserLeft),
            Self::LaserSpeedLeft => Some(Self::LaserSpeedRight),
            Self::LaserSpeedRight => Some(Self::LaserSpeedLeft),
            _ => None,
        }
    }

    /// Name used on the command line and in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::LaserBack => "laserBack",
            Self::TrackNeons => "trackNeons",
            Self::LaserLeft => "laserLeft",
            Self::LaserRight => "laserRight",
            Self::PrimaryLight => "primaryLight",
            Self::LargeRing => "largeRing",
            Self::SmallRing => "smallRing",
            Self::LaserSpeedLeft => "laserSpeedLeft",
            Self::LaserSpeedRight => "laserSpeedRight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|track| track.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorType {
    /// Red.
    Primary,
    /// Blue.
    Secondary,
}

impl ColorType {
    pub fn opposite(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

/// A lighting change. Only `Off` has no color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightingEffect {
    Off,
    On(ColorType),
    Flash(ColorType),
    Fade(ColorType),
}

impl LightingEffect {
    pub fn color(self) -> Option<ColorType> {
        match self {
            Self::Off => None,
            Self::On(color) | Self::Flash(color) | Self::Fade(color) => Some(color),
        }
    }

    pub fn with_color(self, color: ColorType) -> Self {
        match self {
            Self::Off => Self::Off,
            Self::On(_) => Self::On(color),
            Self::Flash(_) => Self::Flash(color),
            Self::Fade(_) => Self::Fade(color),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Lighting(LightingEffect),
    RingTrigger,
    LaserSpeed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    None,
    Selected,
    /// Highlighted by an in-progress selection box.
    Tentative,
}

impl Selection {
    pub fn is_selected(self) -> bool {
        self == Self::Selected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub track: TrackId,
    pub beat_num: f64,
    pub kind: EventKind,
    #[serde(default)]
    pub selected: Selection,
}

impl Event {
    pub fn new(track: TrackId, beat_num: f64, kind: EventKind) -> Self {
        Self {
            id: new_id(),
            track,
            beat_num,
            kind,
            selected: Selection::None,
        }
    }

    pub fn lighting(track: TrackId, beat_num: f64, effect: LightingEffect) -> Self {
        Self::new(track, beat_num, EventKind::Lighting(effect))
    }

    pub fn ring(track: TrackId, beat_num: f64) -> Self {
        Self::new(track, beat_num, EventKind::RingTrigger)
    }

    pub fn laser_speed(track: TrackId, beat_num: f64, speed: u8) -> Self {
        Self::new(track, beat_num, EventKind::LaserSpeed(speed))
    }

    pub fn lighting_effect(&self) -> Option<LightingEffect> {
        match self.kind {
            EventKind::Lighting(effect) => Some(effect),
            _ => None,
        }
    }

    /// Id used for the copy of this event on a locked partner track.
    pub fn mirrored_id(&self) -> String {
        mirrored_id(&self.id)
    }

    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.track == other.track
            && self.beat_num == other.beat_num
            && self.kind == other.kind
    }
}

impl Timed for Event {
    fn beat(&self) -> f64 {
        self.beat_num
    }

    fn set_beat(&mut self, beat: f64) {
        self.beat_num = beat;
    }
}

const MIRRORED_SUFFIX: &str = "-mirrored";

pub(crate) fn mirrored_id(id: &str) -> String {
    format!("{id}{MIRRORED_SUFFIX}")
}

/// The id of the original side when `id` names a locked copy.
pub(crate) fn mirror_original(id: &str) -> Option<&str> {
    id.strip_suffix(MIRRORED_SUFFIX)
}

/// Events grouped per track, each track ordered by `beat_num`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTracks {
    tracks: BTreeMap<TrackId, Vec<Event>>,
}

impl EventTracks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds tracks from an arbitrary list, sorting each track by beat.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut tracks: BTreeMap<TrackId, Vec<Event>> = BTreeMap::new();
        for event in events {
            tracks.entry(event.track).or_default().push(event);
        }
        for events in tracks.values_mut() {
            events.sort_by(|a, b| a.beat_num.total_cmp(&b.beat_num));
        }
        Self { tracks }
    }

    pub fn track(&self, track: TrackId) -> &[Event] {
        self.tracks.get(&track).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.tracks.values().flatten()
    }

    /// Every event ordered by beat. Ties keep track order.
    pub fn sorted_events(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.iter().collect();
        events.sort_by(|a, b| a.beat_num.total_cmp(&b.beat_num));
        events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.tracks.into_values().flatten().collect()
    }

    /// Returns `true` when the track already holds an event at `beat_num`.
    pub fn is_occupied(&self, track: TrackId, beat_num: f64) -> bool {
        self.track(track).iter().any(|event| event.beat_num == beat_num)
    }

    /// Inserts after any events sharing its beat, keeping the track ordered.
    pub(crate) fn insert_sorted(&mut self, event: Event) {
        let events = self.tracks.entry(event.track).or_default();
        let position = events.partition_point(|existing| existing.beat_num <= event.beat_num);
        events.insert(position, event);
    }

    pub(crate) fn remove_where(&mut self, track: TrackId, predicate: impl Fn(&Event) -> bool) -> usize {
        let Some(events) = self.tracks.get_mut(&track) else {
            return 0;
        };
        let before = events.len();
        events.retain(|event| !predicate(event));
        let removed = before - events.len();
        if events.is_empty() {
            self.tracks.remove(&track);
        }
        removed
    }

    pub(crate) fn track_mut(&mut self, track: TrackId) -> Option<&mut Vec<Event>> {
        self.tracks.get_mut(&track)
    }

    pub(crate) fn events_mut(&mut self) -> impl Iterator<Item = &mut Event> {
        self.tracks.values_mut().flatten()
    }
}

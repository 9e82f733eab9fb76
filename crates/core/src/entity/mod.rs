//! Typed in-memory editing model.
//!
//! Notes are identified by their `(time, line_index, line_layer)` cell, while
//! obstacles and events carry generated ids.

mod bookmark;
mod event;

use serde::{Deserialize, Serialize};

use crate::offset::Timed;

pub use bookmark::{Bookmark, BookmarkMap, BOOKMARK_PALETTE};
pub(crate) use event::{mirror_original, mirrored_id};
pub use event::{
    ColorType, Event, EventKind, EventTracks, LightingEffect, Selection, TrackId, TrackKind,
};

/// Generates a fresh entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteColor {
    Red,
    Blue,
}

impl NoteColor {
    pub fn opposite(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    Block(NoteColor),
    Mine,
}

/// Direction a block has to be cut in.
///
/// `Precise` holds an angle in degrees for Mapping Extensions 360° notes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CutDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Any,
    Precise(f64),
}

impl CutDirection {
    /// Mirrors the direction across the vertical axis.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::UpLeft => Self::UpRight,
            Self::UpRight => Self::UpLeft,
            Self::DownLeft => Self::DownRight,
            Self::DownRight => Self::DownLeft,
            Self::Precise(degrees) => Self::Precise((360.0 - degrees).rem_euclid(360.0)),
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub time: f64,
    pub line_index: f64,
    pub line_layer: f64,
    pub kind: NoteKind,
    pub cut_direction: CutDirection,
    #[serde(default)]
    pub selected: bool,
}

impl Note {
    pub fn new(time: f64, line_index: f64, line_layer: f64, kind: NoteKind, cut_direction: CutDirection) -> Self {
        Self {
            time,
            line_index,
            line_layer,
            kind,
            cut_direction,
            selected: false,
        }
    }

    pub fn key(&self) -> NoteKey {
        NoteKey {
            time: self.time,
            line_layer: self.line_layer,
            line_index: self.line_index,
        }
    }

    /// Equality that ignores the selection flag.
    pub fn same_content(&self, other: &Self) -> bool {
        self.time == other.time
            && self.line_index == other.line_index
            && self.line_layer == other.line_layer
            && self.kind == other.kind
            && self.cut_direction == other.cut_direction
    }
}

impl Timed for Note {
    fn beat(&self) -> f64 {
        self.time
    }

    fn set_beat(&mut self, beat: f64) {
        self.time = beat;
    }
}

/// Composite identity of a note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteKey {
    pub time: f64,
    pub line_layer: f64,
    pub line_index: f64,
}

/// Export and storage order for notes: time, then row, then column.
pub fn compare_notes(a: &Note, b: &Note) -> std::cmp::Ordering {
    a.time
        .total_cmp(&b.time)
        .then(a.line_layer.total_cmp(&b.line_layer))
        .then(a.line_index.total_cmp(&b.line_index))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    /// Full-height wall.
    Wall,
    /// Crouch wall spanning the top of the play area.
    Ceiling,
    /// Mapping Extensions wall with an explicit start row and height.
    Extended { row_index: f64, rowspan: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    pub lane: f64,
    pub shape: ObstacleShape,
    pub beat_start: f64,
    pub beat_duration: f64,
    pub colspan: f64,
    #[serde(default)]
    pub fast: bool,
    #[serde(default)]
    pub selected: bool,
}

impl Obstacle {
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.lane == other.lane
            && self.shape == other.shape
            && self.beat_start == other.beat_start
            && self.beat_duration == other.beat_duration
            && self.colspan == other.colspan
            && self.fast == other.fast
    }
}

impl Timed for Obstacle {
    fn beat(&self) -> f64 {
        self.beat_start
    }

    fn set_beat(&mut self, beat: f64) {
        self.beat_start = beat;
    }
}

/// Notes and obstacles share one undo stack, so they travel together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesView {
    pub notes: Vec<Note>,
    pub obstacles: Vec<Obstacle>,
}

impl NotesView {
    pub fn new(notes: Vec<Note>, obstacles: Vec<Obstacle>) -> Self {
        Self { notes, obstacles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_order_by_time_then_row_then_column() {
        let block = NoteKind::Block(NoteColor::Red);
        let mut notes = vec![
            Note::new(1.0, 0.0, 1.0, block, CutDirection::Up),
            Note::new(1.0, 3.0, 0.0, block, CutDirection::Up),
            Note::new(0.5, 2.0, 2.0, block, CutDirection::Up),
            Note::new(1.0, 1.0, 0.0, block, CutDirection::Up),
        ];
        notes.sort_by(compare_notes);

        let cells: Vec<(f64, f64, f64)> = notes
            .iter()
            .map(|n| (n.time, n.line_layer, n.line_index))
            .collect();
        assert_eq!(
            cells,
            vec![(0.5, 2.0, 2.0), (1.0, 0.0, 1.0), (1.0, 0.0, 3.0), (1.0, 1.0, 0.0)]
        );
    }

    #[test]
    fn mirrored_cut_directions() {
        assert_eq!(CutDirection::UpLeft.mirrored(), CutDirection::UpRight);
        assert_eq!(CutDirection::Down.mirrored(), CutDirection::Down);
        assert_eq!(CutDirection::Precise(90.0).mirrored(), CutDirection::Precise(270.0));
        assert_eq!(CutDirection::Precise(0.0).mirrored(), CutDirection::Precise(0.0));
    }

    #[test]
    fn same_content_ignores_selection() {
        let mut a = Note::new(2.0, 1.0, 0.0, NoteKind::Mine, CutDirection::Any);
        let b = a.clone();
        a.selected = true;
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }
}

//! Pure mutation operations.
//!
//! Each function takes ownership of a collection and hands back the updated
//! one. Lookup misses and rejected inserts return the input unchanged.

mod clipboard;
mod events;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{compare_notes, new_id, Note, NoteKey, NoteKind, NotesView, Obstacle, ObstacleShape};
use crate::index::{find_note, find_obstacle};
use crate::offset::round_away_floating_point_nonsense;

pub use clipboard::{paste_events, paste_notes, Clipboard};
pub use events::{
    change_laser_speed, delete_event, delete_selected_events, deselect_all_events, drag_place_event,
    nudge_selected_events, place_event, select_events_in_range, set_event_selected,
    swap_selected_events, switch_event_color, TrackLock,
};

/// Widest plain wall a player can still dodge.
pub const MAX_WALL_COLSPAN: f64 = 2.0;

/// Inserts `note` in storage order. A note on an occupied cell is rejected.
pub fn place_note(mut notes: Vec<Note>, mut note: Note) -> Vec<Note> {
    note.time = round_away_floating_point_nonsense(note.time);
    note.line_index = round_away_floating_point_nonsense(note.line_index);
    note.line_layer = round_away_floating_point_nonsense(note.line_layer);

    if find_note(&notes, &note.key()).is_some() {
        warn!(
            time = note.time,
            line_index = note.line_index,
            line_layer = note.line_layer,
            "cell already holds a note, placement rejected"
        );
        return notes;
    }

    let position = notes.partition_point(|existing| compare_notes(existing, &note).is_lt());
    notes.insert(position, note);
    notes
}

pub fn delete_note(mut notes: Vec<Note>, key: &NoteKey) -> Vec<Note> {
    match find_note(&notes, key) {
        Some(index) => {
            notes.remove(index);
        }
        None => debug!(?key, "no note to delete"),
    }
    notes
}

/// Swaps red and blue. Mines are left alone.
pub fn toggle_note_color(mut notes: Vec<Note>, key: &NoteKey) -> Vec<Note> {
    if let Some(index) = find_note(&notes, key) {
        if let NoteKind::Block(color) = notes[index].kind {
            notes[index].kind = NoteKind::Block(color.opposite());
        }
    }
    notes
}

pub fn set_note_selected(mut notes: Vec<Note>, key: &NoteKey, selected: bool) -> Vec<Note> {
    if let Some(index) = find_note(&notes, key) {
        notes[index].selected = selected;
    }
    notes
}

/// Obstacle as drawn on the grid, before it is anchored to the cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDraft {
    pub lane: f64,
    pub colspan: f64,
    pub beat_duration: f64,
    pub shape: ObstacleShape,
    #[serde(default)]
    pub fast: bool,
}

/// Anchors a draft at `cursor_beat` with a fresh id.
///
/// Outside extended placement, plain walls are clamped to
/// [`MAX_WALL_COLSPAN`] columns.
pub fn build_obstacle(draft: ObstacleDraft, cursor_beat: f64, extended_mode: bool) -> Obstacle {
    let colspan = match draft.shape {
        ObstacleShape::Wall if !extended_mode => draft.colspan.min(MAX_WALL_COLSPAN),
        _ => draft.colspan,
    };

    Obstacle {
        id: new_id(),
        lane: draft.lane,
        shape: draft.shape,
        beat_start: round_away_floating_point_nonsense(cursor_beat),
        beat_duration: draft.beat_duration.max(0.0),
        colspan,
        fast: draft.fast,
        selected: false,
    }
}

pub fn add_obstacle(mut obstacles: Vec<Obstacle>, obstacle: Obstacle) -> Vec<Obstacle> {
    let position = obstacles.partition_point(|existing| existing.beat_start <= obstacle.beat_start);
    obstacles.insert(position, obstacle);
    obstacles
}

pub fn delete_obstacle(mut obstacles: Vec<Obstacle>, id: &str) -> Vec<Obstacle> {
    match find_obstacle(&obstacles, id) {
        Some(index) => {
            obstacles.remove(index);
        }
        None => debug!(id, "no obstacle to delete"),
    }
    obstacles
}

/// Sets the duration of every selected obstacle.
pub fn resize_selected_obstacles(mut obstacles: Vec<Obstacle>, beat_duration: f64) -> Vec<Obstacle> {
    let beat_duration = round_away_floating_point_nonsense(beat_duration.max(0.0));
    for obstacle in obstacles.iter_mut().filter(|o| o.selected) {
        obstacle.beat_duration = beat_duration;
    }
    obstacles
}

pub fn toggle_fast_wall(mut obstacles: Vec<Obstacle>, id: &str) -> Vec<Obstacle> {
    if let Some(index) = find_obstacle(&obstacles, id) {
        obstacles[index].fast = !obstacles[index].fast;
    }
    obstacles
}

pub fn set_obstacle_selected(mut obstacles: Vec<Obstacle>, id: &str, selected: bool) -> Vec<Obstacle> {
    if let Some(index) = find_obstacle(&obstacles, id) {
        obstacles[index].selected = selected;
    }
    obstacles
}

/// Selects everything starting within `[start_beat, end_beat)`.
pub fn select_notes_in_range(mut view: NotesView, start_beat: f64, end_beat: f64) -> NotesView {
    let in_range = |beat: f64| beat >= start_beat && beat < end_beat;
    for note in &mut view.notes {
        note.selected = in_range(note.time);
    }
    for obstacle in &mut view.obstacles {
        obstacle.selected = in_range(obstacle.beat_start);
    }
    view
}

pub fn deselect_all_notes(mut view: NotesView) -> NotesView {
    view.notes.iter_mut().for_each(|note| note.selected = false);
    view.obstacles.iter_mut().for_each(|obstacle| obstacle.selected = false);
    view
}

pub fn delete_selected_notes(mut view: NotesView) -> NotesView {
    view.notes.retain(|note| !note.selected);
    view.obstacles.retain(|obstacle| !obstacle.selected);
    view
}

/// Moves selected notes and obstacles by `beats`. A moved note that lands on
/// an occupied cell is dropped.
pub fn nudge_selected_notes(view: NotesView, beats: f64) -> NotesView {
    let (mut moved, kept): (Vec<Note>, Vec<Note>) = view.notes.into_iter().partition(|n| n.selected);
    for note in &mut moved {
        note.time = round_away_floating_point_nonsense(note.time + beats);
    }
    let notes = moved.into_iter().fold(kept, place_note);

    let mut obstacles = view.obstacles;
    for obstacle in obstacles.iter_mut().filter(|o| o.selected) {
        obstacle.beat_start = round_away_floating_point_nonsense(obstacle.beat_start + beats);
    }
    obstacles.sort_by(|a, b| a.beat_start.total_cmp(&b.beat_start));

    NotesView { notes, obstacles }
}

/// Mirrors the selection horizontally across a grid of `num_cols` columns:
/// lanes flip, note colors swap and cut directions mirror.
pub fn swap_selected_notes(view: NotesView, num_cols: u32) -> NotesView {
    let last_col = f64::from(num_cols) - 1.0;
    let (mut moved, kept): (Vec<Note>, Vec<Note>) = view.notes.into_iter().partition(|n| n.selected);
    for note in &mut moved {
        note.line_index = round_away_floating_point_nonsense(last_col - note.line_index);
        if let NoteKind::Block(color) = note.kind {
            note.kind = NoteKind::Block(color.opposite());
        }
        note.cut_direction = note.cut_direction.mirrored();
    }
    let notes = moved.into_iter().fold(kept, place_note);

    let mut obstacles = view.obstacles;
    for obstacle in obstacles.iter_mut().filter(|o| o.selected) {
        obstacle.lane = round_away_floating_point_nonsense(f64::from(num_cols) - obstacle.colspan - obstacle.lane);
    }

    NotesView { notes, obstacles }
}

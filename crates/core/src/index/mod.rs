//! Lookup helpers over entity collections.
//!
//! A miss is returned as `None`. Callers treat it as a benign no-op: a fast
//! pointer drag can easily ask to delete a note that is already gone.

use crate::entity::{Event, Note, NoteKey, Obstacle};
use crate::offset::Timed;

/// Finds a note by its composite `(time, line_layer, line_index)` key.
pub fn find_note(notes: &[Note], key: &NoteKey) -> Option<usize> {
    notes.iter().position(|note| {
        note.time == key.time && note.line_layer == key.line_layer && note.line_index == key.line_index
    })
}

pub fn find_obstacle(obstacles: &[Obstacle], id: &str) -> Option<usize> {
    obstacles.iter().position(|obstacle| obstacle.id == id)
}

pub fn find_event(events: &[Event], id: &str) -> Option<usize> {
    events.iter().position(|event| event.id == id)
}

/// Scans an ordered list backwards for the last item with
/// `beat < beat + lookahead_beats`.
///
/// The lookahead models audio and render latency so the visual state can run
/// slightly ahead of what is heard.
pub fn find_most_recent_before<T: Timed>(items: &[T], beat: f64, lookahead_beats: f64) -> Option<&T> {
    let horizon = beat + lookahead_beats;
    items.iter().rev().find(|item| item.beat() < horizon)
}

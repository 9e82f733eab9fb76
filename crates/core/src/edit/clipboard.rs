use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::{mirror_original, mirrored_id, new_id, Event, EventTracks, Note, NotesView, Obstacle, Selection};
use crate::offset::round_away_floating_point_nonsense;

use super::{add_obstacle, deselect_all_notes, place_note, TrackLock};
use super::events::{deselect_all_events, place_event};

/// Copied entities with times relative to the earliest copied beat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clipboard {
    pub notes: Vec<Note>,
    pub obstacles: Vec<Obstacle>,
    pub events: Vec<Event>,
}

impl Clipboard {
    /// Copies the current selection. Returns `None` when nothing is selected.
    pub fn copy(view: &NotesView, tracks: &EventTracks) -> Option<Self> {
        let notes: Vec<Note> = view.notes.iter().filter(|n| n.selected).cloned().collect();
        let obstacles: Vec<Obstacle> = view.obstacles.iter().filter(|o| o.selected).cloned().collect();
        let events: Vec<Event> = tracks.iter().filter(|e| e.selected.is_selected()).cloned().collect();

        let earliest = notes
            .iter()
            .map(|n| n.time)
            .chain(obstacles.iter().map(|o| o.beat_start))
            .chain(events.iter().map(|e| e.beat_num))
            .min_by(f64::total_cmp)?;

        let relative = |beat: f64| round_away_floating_point_nonsense(beat - earliest);
        Some(Self {
            notes: notes
                .into_iter()
                .map(|mut n| {
                    n.time = relative(n.time);
                    n
                })
                .collect(),
            obstacles: obstacles
                .into_iter()
                .map(|mut o| {
                    o.beat_start = relative(o.beat_start);
                    o
                })
                .collect(),
            events: events
                .into_iter()
                .map(|mut e| {
                    e.beat_num = relative(e.beat_num);
                    e
                })
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.obstacles.is_empty() && self.events.is_empty()
    }
}

/// Pastes notes and obstacles at `at_beat`. The pasted entities become the
/// selection; notes landing on occupied cells are rejected as usual.
pub fn paste_notes(view: NotesView, clipboard: &Clipboard, at_beat: f64) -> NotesView {
    let mut view = deselect_all_notes(view);
    for note in &clipboard.notes {
        let mut note = note.clone();
        note.time += at_beat;
        note.selected = true;
        view.notes = place_note(view.notes, note);
    }
    for obstacle in &clipboard.obstacles {
        let mut obstacle = obstacle.clone();
        obstacle.id = new_id();
        obstacle.beat_start = round_away_floating_point_nonsense(obstacle.beat_start + at_beat);
        obstacle.selected = true;
        view.obstacles = add_obstacle(view.obstacles, obstacle);
    }
    view
}

/// Pastes events at `at_beat` with fresh ids. Locks are not applied; the
/// clipboard already holds both sides of a copied pair, and a pasted pair
/// keeps its `-mirrored` link so later locked edits still reach both sides.
pub fn paste_events(tracks: EventTracks, clipboard: &Clipboard, at_beat: f64) -> EventTracks {
    let fresh: HashMap<&str, String> = clipboard
        .events
        .iter()
        .filter(|event| mirror_original(&event.id).is_none())
        .map(|event| (event.id.as_str(), new_id()))
        .collect();

    let unlocked = TrackLock::default();
    clipboard
        .events
        .iter()
        .fold(deselect_all_events(tracks), |tracks, event| {
            let id = match mirror_original(&event.id) {
                Some(original) => fresh.get(original).map_or_else(new_id, |id| mirrored_id(id)),
                None => fresh.get(event.id.as_str()).cloned().unwrap_or_else(new_id),
            };
            let event = Event {
                id,
                beat_num: event.beat_num + at_beat,
                selected: Selection::Selected,
                ..event.clone()
            };
            place_event(tracks, event, &unlocked)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::events::{delete_event, select_events_in_range};
    use crate::entity::{ColorType, CutDirection, LightingEffect, NoteColor, NoteKind, TrackId};

    fn selected_note(time: f64) -> Note {
        let mut note = Note::new(time, 1.0, 0.0, NoteKind::Block(NoteColor::Red), CutDirection::Up);
        note.selected = true;
        note
    }

    #[test]
    fn nothing_selected_copies_nothing() {
        assert!(Clipboard::copy(&NotesView::default(), &EventTracks::new()).is_none());
    }

    #[test]
    fn copy_is_relative_to_the_earliest_selection() {
        let mut event = Event::lighting(TrackId::LaserBack, 3.0, LightingEffect::Off);
        event.selected = Selection::Selected;
        let view = NotesView::new(vec![selected_note(4.0), selected_note(6.5)], Vec::new());

        let clipboard = Clipboard::copy(&view, &EventTracks::from_events(vec![event])).unwrap();
        let times: Vec<f64> = clipboard.notes.iter().map(|n| n.time).collect();
        assert_eq!(times, vec![1.0, 3.5]);
        assert_eq!(clipboard.events[0].beat_num, 0.0);
    }

    #[test]
    fn paste_uses_fresh_ids_and_selects_the_result() {
        let mut event = Event::ring(TrackId::SmallRing, 2.0);
        event.selected = Selection::Selected;
        let original_id = event.id.clone();
        let tracks = EventTracks::from_events(vec![event]);
        let view = NotesView::new(vec![selected_note(2.0)], Vec::new());

        let clipboard = Clipboard::copy(&view, &tracks).unwrap();
        let view = paste_notes(view, &clipboard, 10.0);
        let tracks = paste_events(tracks, &clipboard, 10.0);

        assert_eq!(view.notes.len(), 2);
        assert!(!view.notes[0].selected);
        assert!(view.notes[1].selected && view.notes[1].time == 10.0);

        let ring = tracks.track(TrackId::SmallRing);
        assert_eq!(ring.len(), 2);
        assert_ne!(ring[1].id, original_id);
        assert_eq!(ring[1].selected, Selection::Selected);
        assert_eq!(ring[0].selected, Selection::None);
    }

    #[test]
    fn pasted_locked_pair_still_deletes_together() {
        let lock = TrackLock {
            lasers: true,
            laser_speeds: false,
        };
        let flash = Event::lighting(TrackId::LaserLeft, 1.0, LightingEffect::Flash(ColorType::Primary));
        let tracks = place_event(EventTracks::new(), flash, &lock);
        let tracks = select_events_in_range(tracks, 0.0, 2.0);

        let clipboard = Clipboard::copy(&NotesView::default(), &tracks).unwrap();
        let tracks = paste_events(tracks, &clipboard, 8.0);
        let pasted_right = tracks.track(TrackId::LaserRight)[1].clone();
        assert_eq!(pasted_right.beat_num, 8.0);
        assert_eq!(
            pasted_right.id,
            mirrored_id(&tracks.track(TrackId::LaserLeft)[1].id)
        );

        let tracks = delete_event(tracks, TrackId::LaserRight, &pasted_right.id, &lock);
        assert_eq!(tracks.track(TrackId::LaserLeft).len(), 1);
        assert_eq!(tracks.track(TrackId::LaserRight).len(), 1);
        assert_eq!(tracks.track(TrackId::LaserLeft)[0].beat_num, 1.0);
    }
}

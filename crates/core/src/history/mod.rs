//! Bounded undo/redo over entity snapshots.
//!
//! Two stacks exist per session: one over notes and obstacles together and one
//! over events. Each mutation is tagged with an [`ActionKind`]; only undoable
//! kinds push a snapshot, and consecutive bulk kinds coalesce into one step.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::entity::{compare_notes, Event, EventTracks, Note, NotesView, Obstacle};
use crate::timeline::VisibleWindow;

/// Which stack an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope {
    Notes,
    Events,
    Both,
}

/// Every mutation the session can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PlaceNote,
    DeleteNote,
    /// Erasing by dragging across cells.
    BulkDeleteNote,
    ToggleNoteColor,
    PlaceObstacle,
    DeleteObstacle,
    ResizeObstacle,
    ToggleFastWall,
    PlaceEvent,
    /// Painting events by dragging across beats.
    DragPlaceEvent,
    DeleteEvent,
    BulkDeleteEvent,
    ChangeLaserSpeed,
    SwitchEventColor,
    DeleteSelection,
    CutSelection,
    PasteSelection,
    NudgeSelection,
    SwapSelection,
    SelectEntity,
    DeselectAll,
    SelectAllInRange,
    HoverCell,
    DrawSelectionBox,
    PlaybackTick,
}

impl ActionKind {
    /// The stack that records this action, or `None` for transient actions
    /// which only replace the present state.
    pub fn scope(self) -> Option<HistoryScope> {
        use ActionKind::*;

        match self {
            PlaceNote | DeleteNote | BulkDeleteNote | ToggleNoteColor | PlaceObstacle
            | DeleteObstacle | ResizeObstacle | ToggleFastWall => Some(HistoryScope::Notes),
            PlaceEvent | DragPlaceEvent | DeleteEvent | BulkDeleteEvent | ChangeLaserSpeed
            | SwitchEventColor => Some(HistoryScope::Events),
            DeleteSelection | CutSelection | PasteSelection | NudgeSelection | SwapSelection => {
                Some(HistoryScope::Both)
            }
            SelectEntity | DeselectAll | SelectAllInRange | HoverCell | DrawSelectionBox
            | PlaybackTick => None,
        }
    }

    pub fn is_undoable(self) -> bool {
        self.scope().is_some()
    }

    /// Key under which adjacent records coalesce into one undo step.
    pub fn group_key(self) -> Option<ActionKind> {
        match self {
            Self::BulkDeleteNote | Self::BulkDeleteEvent | Self::DragPlaceEvent => Some(self),
            _ => None,
        }
    }
}

/// State tracked by a [`History`].
pub trait Snapshot: Clone + PartialEq {
    /// Earliest beat of any entity that differs between the two snapshots,
    /// ignoring selection.
    fn earliest_difference(&self, other: &Self) -> Option<f64>;
}

/// Outcome of an undo or redo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryStep {
    /// Nothing to undo or redo.
    Empty,
    /// The present changed. `jump_to` is set when the change happened off
    /// screen; the cursor should move there and pause.
    Applied { jump_to: Option<f64> },
}

#[derive(Debug, Clone)]
pub struct History<S> {
    past: VecDeque<S>,
    present: S,
    future: Vec<S>,
    capacity: usize,
    open_group: Option<ActionKind>,
}

impl<S: Snapshot> History<S> {
    pub fn new(initial: S, capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: Vec::new(),
            capacity,
            open_group: None,
        }
    }

    /// Drops all history and starts over from `initial`.
    pub fn reset(&mut self, initial: S) {
        self.past.clear();
        self.future.clear();
        self.present = initial;
        self.open_group = None;
    }

    pub fn present(&self) -> &S {
        &self.present
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Replaces the present with `next`. Returns `true` when a new undo step
    /// was created.
    pub fn record(&mut self, kind: ActionKind, next: S) -> bool {
        if !kind.is_undoable() {
            self.present = next;
            return false;
        }
        if next == self.present {
            return false;
        }

        let group = kind.group_key();
        if group.is_some() && group == self.open_group {
            self.present = next;
            self.future.clear();
            return false;
        }

        let previous = std::mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        self.future.clear();
        self.open_group = group;
        true
    }

    /// Ends a coalescing gesture so the next bulk record starts a new step.
    pub fn break_group(&mut self) {
        self.open_group = None;
    }

    pub fn undo(&mut self, window: &VisibleWindow) -> HistoryStep {
        let Some(previous) = self.past.pop_back() else {
            return HistoryStep::Empty;
        };
        let current = std::mem::replace(&mut self.present, previous);
        let jump_to = cursor_jump(&current, &self.present, window);
        self.future.push(current);
        self.open_group = None;
        HistoryStep::Applied { jump_to }
    }

    pub fn redo(&mut self, window: &VisibleWindow) -> HistoryStep {
        let Some(next) = self.future.pop() else {
            return HistoryStep::Empty;
        };
        let current = std::mem::replace(&mut self.present, next);
        let jump_to = cursor_jump(&current, &self.present, window);
        self.past.push_back(current);
        self.open_group = None;
        HistoryStep::Applied { jump_to }
    }
}

fn cursor_jump<S: Snapshot>(old: &S, new: &S, window: &VisibleWindow) -> Option<f64> {
    old.earliest_difference(new)
        .filter(|beat| !window.contains(*beat))
}

/// Finds the first position where two sorted lists disagree. With a total
/// order whose keys are unique, the smaller beat at that position is the
/// earliest beat touched by any difference.
fn earliest_difference_in<T>(
    a: &[T],
    b: &[T],
    order: impl Fn(&T, &T) -> Ordering,
    same: impl Fn(&T, &T) -> bool,
    beat: impl Fn(&T) -> f64,
) -> Option<f64> {
    let mut a: Vec<&T> = a.iter().collect();
    let mut b: Vec<&T> = b.iter().collect();
    a.sort_by(|x, y| order(x, y));
    b.sort_by(|x, y| order(x, y));

    for index in 0..a.len().max(b.len()) {
        match (a.get(index), b.get(index)) {
            (Some(x), Some(y)) if same(x, y) => continue,
            (Some(x), Some(y)) => return Some(beat(x).min(beat(y))),
            (Some(x), None) => return Some(beat(x)),
            (None, Some(y)) => return Some(beat(y)),
            (None, None) => break,
        }
    }
    None
}

fn min_beat(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn compare_obstacles(a: &Obstacle, b: &Obstacle) -> Ordering {
    a.beat_start.total_cmp(&b.beat_start).then_with(|| a.id.cmp(&b.id))
}

fn compare_events(a: &Event, b: &Event) -> Ordering {
    a.beat_num
        .total_cmp(&b.beat_num)
        .then(a.track.cmp(&b.track))
        .then_with(|| a.id.cmp(&b.id))
}

impl Snapshot for NotesView {
    fn earliest_difference(&self, other: &Self) -> Option<f64> {
        let notes = earliest_difference_in(
            &self.notes,
            &other.notes,
            compare_notes,
            Note::same_content,
            |note| note.time,
        );
        let obstacles = earliest_difference_in(
            &self.obstacles,
            &other.obstacles,
            compare_obstacles,
            Obstacle::same_content,
            |obstacle| obstacle.beat_start,
        );
        min_beat(notes, obstacles)
    }
}

impl Snapshot for EventTracks {
    fn earliest_difference(&self, other: &Self) -> Option<f64> {
        let a: Vec<Event> = self.iter().cloned().collect();
        let b: Vec<Event> = other.iter().cloned().collect();
        earliest_difference_in(&a, &b, compare_events, Event::same_content, |event| event.beat_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CutDirection, LightingEffect, NoteColor, NoteKind, TrackId};

    fn note(time: f64) -> Note {
        Note::new(time, 0.0, 0.0, NoteKind::Block(NoteColor::Red), CutDirection::Up)
    }

    fn view(times: &[f64]) -> NotesView {
        NotesView::new(times.iter().copied().map(note).collect(), Vec::new())
    }

    fn everywhere() -> VisibleWindow {
        VisibleWindow::new(f64::MIN, f64::MAX)
    }

    #[test]
    fn undo_and_redo_move_between_snapshots() {
        let mut history = History::new(view(&[]), 10);
        history.record(ActionKind::PlaceNote, view(&[1.0]));
        history.record(ActionKind::PlaceNote, view(&[1.0, 2.0]));

        assert!(matches!(history.undo(&everywhere()), HistoryStep::Applied { jump_to: None }));
        assert_eq!(history.present(), &view(&[1.0]));

        history.redo(&everywhere());
        assert_eq!(history.present(), &view(&[1.0, 2.0]));
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut history = History::new(view(&[3.0]), 10);
        assert_eq!(history.undo(&everywhere()), HistoryStep::Empty);
        assert_eq!(history.redo(&everywhere()), HistoryStep::Empty);
        assert_eq!(history.present(), &view(&[3.0]));
    }

    #[test]
    fn transient_actions_never_push() {
        let mut history = History::new(view(&[]), 10);
        let mut selected = view(&[]);
        selected.notes.push(note(1.0));
        selected.notes[0].selected = true;

        assert!(!history.record(ActionKind::SelectEntity, selected.clone()));
        assert!(!history.record(ActionKind::PlaybackTick, selected.clone()));
        assert!(!history.can_undo());
        assert_eq!(history.present(), &selected);
    }

    #[test]
    fn unchanged_state_does_not_push() {
        let mut history = History::new(view(&[1.0]), 10);
        assert!(!history.record(ActionKind::PlaceNote, view(&[1.0])));
        assert!(!history.can_undo());
    }

    #[test]
    fn bulk_actions_coalesce_until_the_group_breaks() {
        let mut history = History::new(view(&[1.0, 2.0, 3.0, 4.0]), 10);
        history.record(ActionKind::BulkDeleteNote, view(&[2.0, 3.0, 4.0]));
        history.record(ActionKind::BulkDeleteNote, view(&[3.0, 4.0]));
        history.record(ActionKind::BulkDeleteNote, view(&[4.0]));
        assert_eq!(history.past_len(), 1);

        history.break_group();
        history.record(ActionKind::BulkDeleteNote, view(&[]));
        assert_eq!(history.past_len(), 2);

        history.undo(&everywhere());
        history.undo(&everywhere());
        assert_eq!(history.present(), &view(&[1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn different_kind_ends_a_group() {
        let mut history = History::new(view(&[1.0, 2.0]), 10);
        history.record(ActionKind::BulkDeleteNote, view(&[2.0]));
        history.record(ActionKind::PlaceNote, view(&[2.0, 5.0]));
        history.record(ActionKind::BulkDeleteNote, view(&[5.0]));
        assert_eq!(history.past_len(), 3);
    }

    #[test]
    fn capacity_evicts_the_oldest_snapshot() {
        let mut history = History::new(view(&[]), 3);
        let mut times = Vec::new();
        for beat in 0..5 {
            times.push(f64::from(beat));
            history.record(ActionKind::PlaceNote, view(&times));
        }
        assert_eq!(history.past_len(), 3);

        while let HistoryStep::Applied { .. } = history.undo(&everywhere()) {}
        assert_eq!(history.present(), &view(&[0.0, 1.0]));
    }

    #[test]
    fn recording_clears_redo() {
        let mut history = History::new(view(&[]), 10);
        history.record(ActionKind::PlaceNote, view(&[1.0]));
        history.undo(&everywhere());
        assert!(history.can_redo());

        history.record(ActionKind::PlaceNote, view(&[2.0]));
        assert!(!history.can_redo());
    }

    #[test]
    fn off_screen_undo_requests_a_jump() {
        let mut history = History::new(view(&[1.0]), 10);
        history.record(ActionKind::PlaceNote, view(&[1.0, 40.0]));

        let window = VisibleWindow::new(0.0, 16.0);
        assert_eq!(history.undo(&window), HistoryStep::Applied { jump_to: Some(40.0) });
        assert_eq!(history.redo(&window), HistoryStep::Applied { jump_to: Some(40.0) });

        history.record(ActionKind::PlaceNote, view(&[1.0, 8.0, 40.0]));
        assert_eq!(history.undo(&window), HistoryStep::Applied { jump_to: None });
    }

    #[test]
    fn selection_is_not_a_difference() {
        let a = view(&[1.0, 2.0]);
        let mut b = a.clone();
        b.notes[1].selected = true;
        assert_eq!(a.earliest_difference(&b), None);
    }

    #[test]
    fn event_difference_finds_earliest_beat() {
        let base = vec![
            Event::lighting(TrackId::LaserBack, 1.0, LightingEffect::Off),
            Event::ring(TrackId::LargeRing, 5.0),
        ];
        let a = EventTracks::from_events(base.clone());
        let mut changed = base;
        changed.push(Event::ring(TrackId::SmallRing, 3.0));
        let b = EventTracks::from_events(changed);

        assert_eq!(a.earliest_difference(&b), Some(3.0));
        assert_eq!(a.earliest_difference(&a.clone()), None);
    }
}

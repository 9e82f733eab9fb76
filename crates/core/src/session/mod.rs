//! Per-song edit session.
//!
//! The session owns the two undo stacks and the bookmarks, runs every
//! mutation through [`crate::edit`] and records the result under its
//! [`ActionKind`]. Entities are held in editor time; the offset is removed on
//! load and re-applied on save.

use tracing::{debug, info};

use crate::beatmap::{decode_beatmap, encode_beatmap, encode_legacy_beatmap, Beatmap, LegacyHeader};
use crate::config::EditorConfig;
use crate::edit::{self, Clipboard, ObstacleDraft, TrackLock};
use crate::entity::{BookmarkMap, Event, EventTracks, Note, NoteKey, NotesView, Selection, TrackId};
use crate::history::{ActionKind, History, HistoryStep};
use crate::index::find_most_recent_before;
use crate::info::ModSettings;
use crate::offset::{shift_by_offset, unshift_by_offset};
use crate::storage::BlobStore;
use crate::timeline::{background_boxes, initial_color_before, BackgroundBox, VisibleWindow};
use crate::Result;

/// Song timing the session needs to move between file time and editor time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionContext {
    pub bpm: f64,
    pub offset_ms: f64,
    pub cursor_beat: f64,
}

impl SessionContext {
    pub fn new(bpm: f64, offset_ms: f64) -> Self {
        Self {
            bpm,
            offset_ms,
            cursor_beat: 0.0,
        }
    }

    pub fn visible_window(&self, config: &EditorConfig) -> VisibleWindow {
        VisibleWindow::around(self.cursor_beat, &config.timeline)
    }
}

#[derive(Debug)]
pub struct EditSession {
    config: EditorConfig,
    mods: ModSettings,
    notes: History<NotesView>,
    events: History<EventTracks>,
    bookmarks: BookmarkMap,
    clipboard: Option<Clipboard>,
    lock: TrackLock,
}

impl EditSession {
    pub fn new(config: EditorConfig, mods: ModSettings) -> Self {
        let capacity = config.history.capacity;
        Self {
            config,
            mods,
            notes: History::new(NotesView::default(), capacity),
            events: History::new(EventTracks::new(), capacity),
            bookmarks: BookmarkMap::new(),
            clipboard: None,
            lock: TrackLock::default(),
        }
    }

    /// Replaces the session contents with a decoded difficulty file and
    /// clears both histories.
    pub fn load(&mut self, bytes: &[u8], ctx: &SessionContext) -> Result<()> {
        let map = decode_beatmap(bytes, Some(&self.mods.mapping_extensions))?;
        let Beatmap {
            notes,
            obstacles,
            events,
            bookmarks,
        } = map;

        let notes = unshift_by_offset(notes, ctx.offset_ms, ctx.bpm);
        let obstacles = unshift_by_offset(obstacles, ctx.offset_ms, ctx.bpm);
        let events = EventTracks::from_events(unshift_by_offset(events.into_events(), ctx.offset_ms, ctx.bpm));
        let bookmarks: BookmarkMap = unshift_by_offset(bookmarks.into_vec(), ctx.offset_ms, ctx.bpm)
            .into_iter()
            .collect();

        info!(
            notes = notes.len(),
            obstacles = obstacles.len(),
            events = events.len(),
            bookmarks = bookmarks.len(),
            offset_ms = ctx.offset_ms,
            "loaded difficulty"
        );

        self.notes.reset(NotesView::new(notes, obstacles));
        self.events.reset(events);
        self.bookmarks = bookmarks;
        self.clipboard = None;
        Ok(())
    }

    fn to_file_time(&self, ctx: &SessionContext) -> Beatmap {
        let view = self.notes.present().clone();
        Beatmap {
            notes: shift_by_offset(view.notes, ctx.offset_ms, ctx.bpm),
            obstacles: shift_by_offset(view.obstacles, ctx.offset_ms, ctx.bpm),
            events: EventTracks::from_events(shift_by_offset(
                self.events.present().clone().into_events(),
                ctx.offset_ms,
                ctx.bpm,
            )),
            bookmarks: shift_by_offset(self.bookmarks.clone().into_vec(), ctx.offset_ms, ctx.bpm)
                .into_iter()
                .collect(),
        }
    }

    pub fn save(&self, ctx: &SessionContext) -> Result<Vec<u8>> {
        let map = self.to_file_time(ctx);
        let bytes = encode_beatmap(&map, Some(&self.mods.mapping_extensions))?;
        info!(
            notes = map.notes.len(),
            obstacles = map.obstacles.len(),
            events = map.events.len(),
            bytes = bytes.len(),
            "saved difficulty"
        );
        Ok(bytes)
    }

    pub fn save_legacy(&self, ctx: &SessionContext, note_jump_speed: f64) -> Result<Vec<u8>> {
        let header = LegacyHeader {
            bpm: ctx.bpm,
            note_jump_speed,
        };
        let bytes = encode_legacy_beatmap(&self.to_file_time(ctx), Some(&self.mods.mapping_extensions), header)?;
        info!(bytes = bytes.len(), "saved legacy difficulty");
        Ok(bytes)
    }

    /// Loads `key` from `store`. A missing key starts an empty session and
    /// returns `false`.
    pub fn load_from(&mut self, store: &impl BlobStore, key: &str, ctx: &SessionContext) -> Result<bool> {
        match store.load(key)? {
            Some(bytes) => {
                self.load(&bytes, ctx)?;
                Ok(true)
            }
            None => {
                debug!(key, "nothing stored, starting empty");
                self.notes.reset(NotesView::default());
                self.events.reset(EventTracks::new());
                self.bookmarks = BookmarkMap::new();
                Ok(false)
            }
        }
    }

    pub fn save_to(&self, store: &mut impl BlobStore, key: &str, ctx: &SessionContext) -> Result<()> {
        let bytes = self.save(ctx)?;
        store.save(key, &bytes)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mods(&self) -> &ModSettings {
        &self.mods
    }

    pub fn notes(&self) -> &NotesView {
        self.notes.present()
    }

    pub fn events(&self) -> &EventTracks {
        self.events.present()
    }

    pub fn bookmarks(&self) -> &BookmarkMap {
        &self.bookmarks
    }

    pub fn bookmarks_mut(&mut self) -> &mut BookmarkMap {
        &mut self.bookmarks
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn track_lock(&self) -> TrackLock {
        self.lock
    }

    pub fn set_track_lock(&mut self, lock: TrackLock) {
        self.lock = lock;
    }

    fn num_cols(&self) -> u32 {
        if self.mods.mapping_extensions.is_enabled {
            self.mods.mapping_extensions.num_cols
        } else {
            self.config.grid.num_cols
        }
    }

    fn record_notes(&mut self, kind: ActionKind, edit: impl FnOnce(NotesView) -> NotesView) -> bool {
        let next = edit(self.notes.present().clone());
        self.notes.record(kind, next)
    }

    fn record_events(&mut self, kind: ActionKind, edit: impl FnOnce(EventTracks) -> EventTracks) -> bool {
        let next = edit(self.events.present().clone());
        self.events.record(kind, next)
    }

    fn record_both(
        &mut self,
        kind: ActionKind,
        notes: impl FnOnce(NotesView) -> NotesView,
        events: impl FnOnce(EventTracks) -> EventTracks,
    ) -> bool {
        let notes_changed = self.record_notes(kind, notes);
        let events_changed = self.record_events(kind, events);
        notes_changed || events_changed
    }

    pub fn place_note(&mut self, note: Note) -> bool {
        self.record_notes(ActionKind::PlaceNote, |mut view| {
            view.notes = edit::place_note(view.notes, note);
            view
        })
    }

    pub fn delete_note(&mut self, key: &NoteKey) -> bool {
        self.record_notes(ActionKind::DeleteNote, |mut view| {
            view.notes = edit::delete_note(view.notes, key);
            view
        })
    }

    /// One step of a drag-erase gesture. Consecutive calls undo together
    /// until [`EditSession::end_gesture`].
    pub fn bulk_delete_note(&mut self, key: &NoteKey) -> bool {
        self.record_notes(ActionKind::BulkDeleteNote, |mut view| {
            view.notes = edit::delete_note(view.notes, key);
            view
        })
    }

    pub fn toggle_note_color(&mut self, key: &NoteKey) -> bool {
        self.record_notes(ActionKind::ToggleNoteColor, |mut view| {
            view.notes = edit::toggle_note_color(view.notes, key);
            view
        })
    }

    pub fn select_note(&mut self, key: &NoteKey, selected: bool) {
        self.record_notes(ActionKind::SelectEntity, |mut view| {
            view.notes = edit::set_note_selected(view.notes, key, selected);
            view
        });
    }

    /// Anchors `draft` at the cursor. Wide plain walls are only allowed with
    /// Mapping Extensions enabled.
    pub fn place_obstacle(&mut self, draft: ObstacleDraft, ctx: &SessionContext) -> bool {
        let obstacle = edit::build_obstacle(draft, ctx.cursor_beat, self.mods.mapping_extensions.is_enabled);
        self.record_notes(ActionKind::PlaceObstacle, |mut view| {
            view.obstacles = edit::add_obstacle(view.obstacles, obstacle);
            view
        })
    }

    pub fn delete_obstacle(&mut self, id: &str) -> bool {
        self.record_notes(ActionKind::DeleteObstacle, |mut view| {
            view.obstacles = edit::delete_obstacle(view.obstacles, id);
            view
        })
    }

    pub fn resize_selected_obstacles(&mut self, beat_duration: f64) -> bool {
        self.record_notes(ActionKind::ResizeObstacle, |mut view| {
            view.obstacles = edit::resize_selected_obstacles(view.obstacles, beat_duration);
            view
        })
    }

    pub fn toggle_fast_wall(&mut self, id: &str) -> bool {
        self.record_notes(ActionKind::ToggleFastWall, |mut view| {
            view.obstacles = edit::toggle_fast_wall(view.obstacles, id);
            view
        })
    }

    pub fn select_obstacle(&mut self, id: &str, selected: bool) {
        self.record_notes(ActionKind::SelectEntity, |mut view| {
            view.obstacles = edit::set_obstacle_selected(view.obstacles, id, selected);
            view
        });
    }

    pub fn place_event(&mut self, event: Event) -> bool {
        let lock = self.lock;
        self.record_events(ActionKind::PlaceEvent, |tracks| edit::place_event(tracks, event, &lock))
    }

    /// One step of a drag-paint gesture, coalesced like
    /// [`EditSession::bulk_delete_note`].
    pub fn drag_place_event(&mut self, event: Event) -> bool {
        let lock = self.lock;
        self.record_events(ActionKind::DragPlaceEvent, |tracks| {
            edit::drag_place_event(tracks, event, &lock)
        })
    }

    pub fn delete_event(&mut self, track: TrackId, id: &str) -> bool {
        let lock = self.lock;
        self.record_events(ActionKind::DeleteEvent, |tracks| edit::delete_event(tracks, track, id, &lock))
    }

    pub fn bulk_delete_event(&mut self, track: TrackId, id: &str) -> bool {
        let lock = self.lock;
        self.record_events(ActionKind::BulkDeleteEvent, |tracks| {
            edit::delete_event(tracks, track, id, &lock)
        })
    }

    pub fn change_laser_speed(&mut self, track: TrackId, id: &str, speed: u8) -> bool {
        let lock = self.lock;
        self.record_events(ActionKind::ChangeLaserSpeed, |tracks| {
            edit::change_laser_speed(tracks, track, id, speed, &lock)
        })
    }

    pub fn switch_event_color(&mut self) -> bool {
        self.record_events(ActionKind::SwitchEventColor, edit::switch_event_color)
    }

    pub fn select_event(&mut self, track: TrackId, id: &str, selected: Selection) {
        self.record_events(ActionKind::SelectEntity, |tracks| {
            edit::set_event_selected(tracks, track, id, selected)
        });
    }

    pub fn select_all_in_range(&mut self, start_beat: f64, end_beat: f64) {
        self.record_both(
            ActionKind::SelectAllInRange,
            |view| edit::select_notes_in_range(view, start_beat, end_beat),
            |tracks| edit::select_events_in_range(tracks, start_beat, end_beat),
        );
    }

    pub fn deselect_all(&mut self) {
        self.record_both(ActionKind::DeselectAll, edit::deselect_all_notes, edit::deselect_all_events);
    }

    pub fn delete_selection(&mut self) -> bool {
        self.record_both(
            ActionKind::DeleteSelection,
            edit::delete_selected_notes,
            edit::delete_selected_events,
        )
    }

    /// Copies the selection. Returns `false` when nothing is selected, in
    /// which case the previous clipboard is kept.
    pub fn copy_selection(&mut self) -> bool {
        match Clipboard::copy(self.notes.present(), self.events.present()) {
            Some(clipboard) => {
                self.clipboard = Some(clipboard);
                true
            }
            None => false,
        }
    }

    pub fn cut_selection(&mut self) -> bool {
        if !self.copy_selection() {
            return false;
        }
        self.record_both(
            ActionKind::CutSelection,
            edit::delete_selected_notes,
            edit::delete_selected_events,
        )
    }

    pub fn paste(&mut self, at_beat: f64) -> bool {
        let Some(clipboard) = self.clipboard.take() else {
            return false;
        };
        let changed = self.record_both(
            ActionKind::PasteSelection,
            |view| edit::paste_notes(view, &clipboard, at_beat),
            |tracks| edit::paste_events(tracks, &clipboard, at_beat),
        );
        self.clipboard = Some(clipboard);
        changed
    }

    pub fn nudge_selection(&mut self, beats: f64) -> bool {
        self.record_both(
            ActionKind::NudgeSelection,
            |view| edit::nudge_selected_notes(view, beats),
            |tracks| edit::nudge_selected_events(tracks, beats),
        )
    }

    pub fn swap_selection(&mut self) -> bool {
        let num_cols = self.num_cols();
        self.record_both(
            ActionKind::SwapSelection,
            |view| edit::swap_selected_notes(view, num_cols),
            edit::swap_selected_events,
        )
    }

    /// Pointer release: the next bulk action starts a fresh undo step.
    pub fn end_gesture(&mut self) {
        self.notes.break_group();
        self.events.break_group();
    }

    pub fn undo_notes(&mut self, window: &VisibleWindow) -> HistoryStep {
        self.notes.undo(window)
    }

    pub fn redo_notes(&mut self, window: &VisibleWindow) -> HistoryStep {
        self.notes.redo(window)
    }

    pub fn undo_events(&mut self, window: &VisibleWindow) -> HistoryStep {
        self.events.undo(window)
    }

    pub fn redo_events(&mut self, window: &VisibleWindow) -> HistoryStep {
        self.events.redo(window)
    }

    /// Lit spans of a lighting track within `[start_beat, start_beat + num_beats)`.
    pub fn background_boxes(&self, track: TrackId, start_beat: f64, num_beats: f64) -> Vec<BackgroundBox> {
        let events = self.events.present().track(track);
        let initial = initial_color_before(events, start_beat);
        background_boxes(events, track, initial, start_beat, num_beats)
    }

    /// The event driving `track` at `beat`, allowing for the configured
    /// visual lookahead.
    pub fn active_event(&self, track: TrackId, beat: f64) -> Option<&Event> {
        find_most_recent_before(self.events.present().track(track), beat, self.config.timeline.lookahead_beats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ColorType, CutDirection, LightingEffect, NoteColor, NoteKind, ObstacleShape};
    use crate::storage::MemoryStore;

    const MAP: &str = r#"{
        "_version": "2.0.0",
        "_notes": [
            {"_time": 3.0, "_lineIndex": 1, "_lineLayer": 0, "_type": 0, "_cutDirection": 1},
            {"_time": 5.0, "_lineIndex": 2, "_lineLayer": 0, "_type": 1, "_cutDirection": 1}
        ],
        "_obstacles": [],
        "_events": [
            {"_time": 2.0, "_type": 0, "_value": 5},
            {"_time": 6.0, "_type": 0, "_value": 0}
        ],
        "_customData": {"_bookmarks": [{"_time": 10.0, "_name": "Drop"}]}
    }"#;

    /// 120 bpm and a 1000 ms offset: two beats.
    fn ctx() -> SessionContext {
        SessionContext::new(120.0, 1000.0)
    }

    fn loaded() -> EditSession {
        let mut session = EditSession::new(EditorConfig::default(), ModSettings::default());
        session.load(MAP.as_bytes(), &ctx()).unwrap();
        session
    }

    fn everywhere() -> VisibleWindow {
        VisibleWindow::new(f64::MIN, f64::MAX)
    }

    fn block(time: f64, index: f64) -> Note {
        Note::new(time, index, 0.0, NoteKind::Block(NoteColor::Red), CutDirection::Down)
    }

    #[test]
    fn load_removes_the_offset() {
        let session = loaded();
        let times: Vec<f64> = session.notes().notes.iter().map(|n| n.time).collect();
        assert_eq!(times, vec![1.0, 3.0]);
        assert_eq!(session.events().track(TrackId::LaserBack)[0].beat_num, 0.0);
        assert_eq!(session.bookmarks().get(8.0).unwrap().name, "Drop");
    }

    #[test]
    fn save_restores_file_time() {
        let session = loaded();
        let bytes = session.save(&ctx()).unwrap();

        let map = decode_beatmap(&bytes, None).unwrap();
        let times: Vec<f64> = map.notes.iter().map(|n| n.time).collect();
        assert_eq!(times, vec![3.0, 5.0]);
        assert!(map.bookmarks.get(10.0).is_some());
    }

    #[test]
    fn edits_undo_and_redo() {
        let mut session = loaded();
        assert!(session.place_note(block(2.0, 0.0)));
        assert!(!session.place_note(block(2.0, 0.0)));
        assert_eq!(session.notes().notes.len(), 3);

        assert!(matches!(session.undo_notes(&everywhere()), HistoryStep::Applied { .. }));
        assert_eq!(session.notes().notes.len(), 2);
        assert_eq!(session.undo_notes(&everywhere()), HistoryStep::Empty);

        session.redo_notes(&everywhere());
        assert_eq!(session.notes().notes.len(), 3);
    }

    #[test]
    fn drag_erase_undoes_in_one_step() {
        let mut session = loaded();
        let keys: Vec<NoteKey> = session.notes().notes.iter().map(Note::key).collect();
        for key in &keys {
            session.bulk_delete_note(key);
        }
        session.end_gesture();
        assert!(session.notes().notes.is_empty());

        session.undo_notes(&everywhere());
        assert_eq!(session.notes().notes.len(), 2);
    }

    #[test]
    fn selection_changes_are_not_undoable() {
        let mut session = loaded();
        session.select_all_in_range(0.0, 2.0);
        assert!(session.notes().notes[0].selected);
        assert_eq!(session.undo_notes(&everywhere()), HistoryStep::Empty);
        assert_eq!(session.undo_events(&everywhere()), HistoryStep::Empty);
    }

    #[test]
    fn cut_and_paste_span_both_stacks() {
        let mut session = loaded();
        session.select_all_in_range(0.0, 2.0);
        assert!(session.cut_selection());
        assert_eq!(session.notes().notes.len(), 1);
        assert_eq!(session.events().track(TrackId::LaserBack).len(), 1);

        assert!(session.paste(16.0));
        assert_eq!(session.notes().notes[1].time, 17.0);
        assert_eq!(session.events().track(TrackId::LaserBack)[1].beat_num, 16.0);

        session.undo_notes(&everywhere());
        session.undo_events(&everywhere());
        assert_eq!(session.notes().notes.len(), 1);
        assert_eq!(session.events().track(TrackId::LaserBack).len(), 1);
    }

    #[test]
    fn off_screen_undo_asks_for_a_jump() {
        let mut session = loaded();
        session.place_note(block(40.0, 0.0));

        let window = ctx().visible_window(session.config());
        assert_eq!(session.undo_notes(&window), HistoryStep::Applied { jump_to: Some(40.0) });
    }

    #[test]
    fn obstacles_anchor_at_the_cursor() {
        let mut session = loaded();
        let draft = ObstacleDraft {
            lane: 0.0,
            colspan: 3.0,
            beat_duration: 2.0,
            shape: ObstacleShape::Wall,
            fast: false,
        };
        let mut context = ctx();
        context.cursor_beat = 4.5;
        assert!(session.place_obstacle(draft, &context));

        let wall = &session.notes().obstacles[0];
        assert_eq!(wall.beat_start, 4.5);
        assert_eq!(wall.colspan, 2.0);
    }

    #[test]
    fn locked_events_mirror_through_the_session() {
        let mut session = loaded();
        session.set_track_lock(TrackLock {
            lasers: true,
            laser_speeds: false,
        });
        let event = Event::lighting(TrackId::LaserLeft, 1.0, LightingEffect::On(ColorType::Primary));
        assert!(session.place_event(event));
        assert_eq!(session.events().track(TrackId::LaserRight).len(), 1);
    }

    #[test]
    fn background_boxes_follow_the_present_state() {
        let session = loaded();
        let boxes = session.background_boxes(TrackId::LaserBack, 0.0, 8.0);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].beat_num, 0.0);
        assert_eq!(boxes[0].duration, 4.0);
        assert_eq!(boxes[0].color_type, ColorType::Primary);

        assert!(session.active_event(TrackId::LaserBack, 0.0).is_none());
        assert!(session.active_event(TrackId::LaserBack, 1.0).is_some());
    }

    #[test]
    fn store_round_trip() {
        let mut store = MemoryStore::new();
        let session = loaded();
        session.save_to(&mut store, "song/Expert.dat", &ctx()).unwrap();

        let mut reopened = EditSession::new(EditorConfig::default(), ModSettings::default());
        assert!(reopened.load_from(&store, "song/Expert.dat", &ctx()).unwrap());
        assert_eq!(reopened.notes().notes.len(), 2);
        assert!(!reopened.load_from(&store, "song/Hard.dat", &ctx()).unwrap());
        assert!(reopened.notes().notes.is_empty());
    }
}

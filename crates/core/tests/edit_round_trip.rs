use beatmap_editor_core::{
    decode_beatmap, ColorType, CutDirection, EditSession, EditorConfig, Event, HistoryStep,
    LightingEffect, MappingExtensionsSettings, MemoryStore, ModSettings, Note, NoteColor, NoteKind,
    SessionContext, TrackId, VisibleWindow,
};

const EXPERT: &str = r#"{
    "_version": "2.0.0",
    "_notes": [
        {"_time": 4.5, "_lineIndex": 0, "_lineLayer": 0, "_type": 0, "_cutDirection": 1},
        {"_time": 4.5, "_lineIndex": 3, "_lineLayer": 0, "_type": 1, "_cutDirection": 1},
        {"_time": 6.5, "_lineIndex": 1, "_lineLayer": 2, "_type": 3, "_cutDirection": 0}
    ],
    "_obstacles": [
        {"_time": 8.5, "_lineIndex": 0, "_type": 1, "_duration": 1.0, "_width": 4}
    ],
    "_events": [
        {"_time": 0.5, "_type": 2, "_value": 1},
        {"_time": 2.5, "_type": 2, "_value": 7},
        {"_time": 4.5, "_type": 12, "_value": 3},
        {"_time": 4.5, "_type": 8, "_value": 0}
    ],
    "_customData": {"_time": 0, "_bookmarks": []}
}"#;

/// Half a beat of offset at 120 bpm.
fn ctx() -> SessionContext {
    SessionContext::new(120.0, 250.0)
}

fn everywhere() -> VisibleWindow {
    VisibleWindow::new(f64::MIN, f64::MAX)
}

#[test]
fn load_edit_undo_save() {
    let mut session = EditSession::new(EditorConfig::default(), ModSettings::default());
    session.load(EXPERT.as_bytes(), &ctx()).unwrap();
    assert_eq!(session.notes().notes[0].time, 4.0);

    let untouched = session.save(&ctx()).unwrap();

    session.place_note(Note::new(
        12.0,
        2.0,
        1.0,
        NoteKind::Block(NoteColor::Blue),
        CutDirection::Left,
    ));
    session.place_event(Event::lighting(
        TrackId::LaserBack,
        12.0,
        LightingEffect::Flash(ColorType::Primary),
    ));
    session.bookmarks_mut().create(12.0, "Bridge");

    let edited = decode_beatmap(&session.save(&ctx()).unwrap(), None).unwrap();
    assert_eq!(edited.notes.len(), 4);
    assert_eq!(edited.notes[3].time, 12.5);
    assert_eq!(edited.events.track(TrackId::LaserBack)[0].beat_num, 12.5);
    assert_eq!(edited.bookmarks.get(12.5).unwrap().name, "Bridge");

    assert!(matches!(session.undo_notes(&everywhere()), HistoryStep::Applied { .. }));
    assert!(matches!(session.undo_events(&everywhere()), HistoryStep::Applied { .. }));
    session.bookmarks_mut().delete(12.0);

    let restored = decode_beatmap(&session.save(&ctx()).unwrap(), None).unwrap();
    let original = decode_beatmap(&untouched, None).unwrap();
    assert_eq!(restored.notes, original.notes);
    assert_eq!(restored.obstacles.len(), original.obstacles.len());
    assert_eq!(restored.events.len(), original.events.len());
}

#[test]
fn lights_survive_a_round_trip_through_the_store() {
    let mut store = MemoryStore::new();
    let mut session = EditSession::new(EditorConfig::default(), ModSettings::default());
    session.load(EXPERT.as_bytes(), &ctx()).unwrap();
    session.save_to(&mut store, "song/Expert.dat", &ctx()).unwrap();

    let mut reopened = EditSession::new(EditorConfig::default(), ModSettings::default());
    reopened.load_from(&store, "song/Expert.dat", &ctx()).unwrap();

    let boxes = reopened.background_boxes(TrackId::LaserLeft, 0.0, 8.0);
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].beat_num, 0.0);
    assert_eq!(boxes[0].duration, 2.0);
    assert_eq!(boxes[0].color_type, ColorType::Secondary);
}

#[test]
fn extended_grid_session_keeps_raw_columns() {
    let mods = ModSettings {
        mapping_extensions: MappingExtensionsSettings::enabled(8, 3, 0.5, 1.0),
        ..ModSettings::default()
    };
    let mut session = EditSession::new(EditorConfig::default(), mods.clone());
    session.place_note(Note::new(
        1.0,
        7.0,
        0.0,
        NoteKind::Block(NoteColor::Red),
        CutDirection::Up,
    ));

    let bytes = session.save(&ctx()).unwrap();
    let mut reopened = EditSession::new(EditorConfig::default(), mods);
    reopened.load(&bytes, &ctx()).unwrap();
    assert_eq!(reopened.notes().notes[0].line_index, 7.0);
}

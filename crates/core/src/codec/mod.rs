//! Conversion between wire records and typed entities.
//!
//! Every function here is total on well-formed input. An unrecognised track,
//! value, obstacle type or note type is an error, and the `Result`-collecting
//! callers abort the whole decode on the first one.

pub mod wire;

use crate::entity::{
    compare_notes, new_id, ColorType, CutDirection, Event, EventKind, EventTracks, LightingEffect,
    Note, NoteColor, NoteKind, Obstacle, ObstacleShape, Selection, TrackId, TrackKind,
};
use crate::mapping::{pack_precision, unpack_precision};
use crate::offset::round_away_floating_point_nonsense;
use crate::{BeatmapError, Result};

pub use wire::{WireBookmark, WireEvent, WireNote, WireObstacle};

/// Added to every packed extended-wall `_type` so it clears the plain types.
pub const EXTENDED_WALL_TYPE_OFFSET: i64 = 4001;
/// Largest `_type` the engine accepts for a packed extended wall.
pub const EXTENDED_WALL_TYPE_MAX: i64 = 4_005_000;

/// Wall height: 0..5 rows maps onto 0..4000 height units, stored ×1000.
const WALL_HEIGHT_ROWS: (f64, f64) = (0.0, 5.0);
const WALL_HEIGHT_UNITS: (f64, f64) = (0.0, 4000.0);
/// Wall start: rows 0..2 map onto 100..400 start units, the low three digits.
const WALL_START_ROWS: (f64, f64) = (0.0, 2.0);
const WALL_START_UNITS: (f64, f64) = (100.0, 400.0);
/// Start units must stay below 500 or they would round into the height digit.
const MAX_WALL_START_UNITS: f64 = 499.0;

/// The engine does not render obstacles with a zero duration.
const MIN_OBSTACLE_DURATION: f64 = 0.01;

const WIRE_NOTE_RED: i64 = 0;
const WIRE_NOTE_BLUE: i64 = 1;
const WIRE_NOTE_MINE: i64 = 3;

/// Mapping Extensions 360° notes store `1000 + degrees`.
const PRECISE_CUT_BASE: i64 = 1000;
const PRECISE_CUT_MAX: i64 = 1360;

const WIRE_OBSTACLE_WALL: i64 = 0;
const WIRE_OBSTACLE_CEILING: i64 = 1;

fn normalize(value: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    to.0 + (value - from.0) / (from.1 - from.0) * (to.1 - to.0)
}

fn cut_direction_to_wire(direction: CutDirection) -> i64 {
    match direction {
        CutDirection::Up => 0,
        CutDirection::Down => 1,
        CutDirection::Left => 2,
        CutDirection::Right => 3,
        CutDirection::UpLeft => 4,
        CutDirection::UpRight => 5,
        CutDirection::DownLeft => 6,
        CutDirection::DownRight => 7,
        CutDirection::Any => 8,
        CutDirection::Precise(degrees) => PRECISE_CUT_BASE + degrees.round() as i64,
    }
}

fn cut_direction_from_wire(value: i64) -> Result<CutDirection> {
    let direction = match value {
        0 => CutDirection::Up,
        1 => CutDirection::Down,
        2 => CutDirection::Left,
        3 => CutDirection::Right,
        4 => CutDirection::UpLeft,
        5 => CutDirection::UpRight,
        6 => CutDirection::DownLeft,
        7 => CutDirection::DownRight,
        8 => CutDirection::Any,
        PRECISE_CUT_BASE..=PRECISE_CUT_MAX => CutDirection::Precise((value - PRECISE_CUT_BASE) as f64),
        other => return Err(BeatmapError::UnknownCutDirection(other)),
    };
    Ok(direction)
}

pub fn note_to_wire(note: &Note) -> WireNote {
    let kind = match note.kind {
        NoteKind::Block(NoteColor::Red) => WIRE_NOTE_RED,
        NoteKind::Block(NoteColor::Blue) => WIRE_NOTE_BLUE,
        NoteKind::Mine => WIRE_NOTE_MINE,
    };

    WireNote {
        time: round_away_floating_point_nonsense(note.time),
        line_index: round_away_floating_point_nonsense(note.line_index).round() as i64,
        line_layer: round_away_floating_point_nonsense(note.line_layer).round() as i64,
        kind,
        cut_direction: cut_direction_to_wire(note.cut_direction),
    }
}

pub fn note_from_wire(wire: &WireNote) -> Result<Note> {
    let kind = match wire.kind {
        WIRE_NOTE_RED => NoteKind::Block(NoteColor::Red),
        WIRE_NOTE_BLUE => NoteKind::Block(NoteColor::Blue),
        WIRE_NOTE_MINE => NoteKind::Mine,
        other => return Err(BeatmapError::UnknownNoteType(other)),
    };

    Ok(Note {
        time: round_away_floating_point_nonsense(wire.time),
        line_index: wire.line_index as f64,
        line_layer: wire.line_layer as f64,
        kind,
        cut_direction: cut_direction_from_wire(wire.cut_direction)?,
        selected: false,
    })
}

/// Encodes notes ordered by time, then row, then column. The engine is
/// sensitive to this tiebreak.
pub fn notes_to_wire(notes: &[Note]) -> Vec<WireNote> {
    let mut wire: Vec<WireNote> = notes.iter().map(note_to_wire).collect();
    wire.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(a.line_layer.cmp(&b.line_layer))
            .then(a.line_index.cmp(&b.line_index))
    });
    wire
}

pub fn notes_from_wire(wire: &[WireNote]) -> Result<Vec<Note>> {
    let mut notes = wire.iter().map(note_from_wire).collect::<Result<Vec<_>>>()?;
    notes.sort_by(compare_notes);
    Ok(notes)
}

pub fn obstacle_to_wire(obstacle: &Obstacle) -> WireObstacle {
    let (kind, line_index, width) = match obstacle.shape {
        ObstacleShape::Wall => (
            WIRE_OBSTACLE_WALL,
            obstacle.lane.round() as i64,
            obstacle.colspan.round() as i64,
        ),
        ObstacleShape::Ceiling => (
            WIRE_OBSTACLE_CEILING,
            obstacle.lane.round() as i64,
            obstacle.colspan.round() as i64,
        ),
        ObstacleShape::Extended { row_index, rowspan } => {
            let height = normalize(rowspan, WALL_HEIGHT_ROWS, WALL_HEIGHT_UNITS)
                .round()
                .clamp(WALL_HEIGHT_UNITS.0, WALL_HEIGHT_UNITS.1);
            let start = normalize(row_index, WALL_START_ROWS, WALL_START_UNITS)
                .round()
                .clamp(0.0, MAX_WALL_START_UNITS);
            let kind = height as i64 * 1000 + start as i64 + EXTENDED_WALL_TYPE_OFFSET;
            (
                kind,
                pack_precision(obstacle.lane) as i64,
                pack_precision(obstacle.colspan) as i64,
            )
        }
    };

    let duration = round_away_floating_point_nonsense(obstacle.beat_duration);
    let duration = if duration == 0.0 { MIN_OBSTACLE_DURATION } else { duration };

    WireObstacle {
        time: round_away_floating_point_nonsense(obstacle.beat_start),
        line_index,
        kind,
        duration: if obstacle.fast { -duration } else { duration },
        width,
    }
}

pub fn obstacle_from_wire(wire: &WireObstacle) -> Result<Obstacle> {
    let (shape, lane, colspan) = match wire.kind {
        WIRE_OBSTACLE_WALL => (ObstacleShape::Wall, wire.line_index as f64, wire.width as f64),
        WIRE_OBSTACLE_CEILING => (ObstacleShape::Ceiling, wire.line_index as f64, wire.width as f64),
        EXTENDED_WALL_TYPE_OFFSET..=EXTENDED_WALL_TYPE_MAX => {
            let type_value = wire.kind - EXTENDED_WALL_TYPE_OFFSET;
            // Height is the thousands field only; the low three digits are
            // always start units, even from writers that exceed 499.
            let height_units = (type_value / 1000) as f64;
            let start_units = (type_value % 1000) as f64;
            let shape = ObstacleShape::Extended {
                row_index: round_away_floating_point_nonsense(normalize(
                    start_units,
                    WALL_START_UNITS,
                    WALL_START_ROWS,
                )),
                rowspan: round_away_floating_point_nonsense(normalize(
                    height_units,
                    WALL_HEIGHT_UNITS,
                    WALL_HEIGHT_ROWS,
                )),
            };
            (
                shape,
                unpack_precision(wire.line_index as f64),
                unpack_precision(wire.width as f64),
            )
        }
        other => return Err(BeatmapError::UnknownObstacleType(other)),
    };

    Ok(Obstacle {
        id: new_id(),
        lane: round_away_floating_point_nonsense(lane),
        shape,
        beat_start: round_away_floating_point_nonsense(wire.time),
        beat_duration: round_away_floating_point_nonsense(wire.duration.abs()),
        colspan: round_away_floating_point_nonsense(colspan),
        fast: wire.duration < 0.0,
        selected: false,
    })
}

pub fn obstacles_to_wire(obstacles: &[Obstacle]) -> Vec<WireObstacle> {
    let mut wire: Vec<WireObstacle> = obstacles.iter().map(obstacle_to_wire).collect();
    wire.sort_by(|a, b| a.time.total_cmp(&b.time));
    wire
}

pub fn obstacles_from_wire(wire: &[WireObstacle]) -> Result<Vec<Obstacle>> {
    let mut obstacles = wire.iter().map(obstacle_from_wire).collect::<Result<Vec<_>>>()?;
    obstacles.sort_by(|a, b| a.beat_start.total_cmp(&b.beat_start));
    Ok(obstacles)
}

/// Lighting `_value` table. 1..=3 are the secondary (blue) variants and
/// 5..=7 the primary (red) ones. 4 is reserved by the engine and reads as off.
fn lighting_to_value(effect: LightingEffect) -> i64 {
    match effect {
        LightingEffect::Off => 0,
        LightingEffect::On(ColorType::Secondary) => 1,
        LightingEffect::Flash(ColorType::Secondary) => 2,
        LightingEffect::Fade(ColorType::Secondary) => 3,
        LightingEffect::On(ColorType::Primary) => 5,
        LightingEffect::Flash(ColorType::Primary) => 6,
        LightingEffect::Fade(ColorType::Primary) => 7,
    }
}

fn lighting_from_value(value: i64) -> Option<LightingEffect> {
    let effect = match value {
        0 | 4 => LightingEffect::Off,
        1 => LightingEffect::On(ColorType::Secondary),
        2 => LightingEffect::Flash(ColorType::Secondary),
        3 => LightingEffect::Fade(ColorType::Secondary),
        5 => LightingEffect::On(ColorType::Primary),
        6 => LightingEffect::Flash(ColorType::Primary),
        7 => LightingEffect::Fade(ColorType::Primary),
        _ => return None,
    };
    Some(effect)
}

pub fn event_to_wire(event: &Event) -> WireEvent {
    let value = match event.kind {
        EventKind::Lighting(effect) => lighting_to_value(effect),
        EventKind::RingTrigger => 0,
        EventKind::LaserSpeed(speed) => i64::from(speed),
    };

    WireEvent {
        time: round_away_floating_point_nonsense(event.beat_num),
        kind: event.track.wire_id(),
        value,
    }
}

pub fn event_from_wire(wire: &WireEvent) -> Result<Event> {
    let track = TrackId::from_wire(wire.kind).ok_or(BeatmapError::UnknownTrack(wire.kind))?;
    let unknown_value = || BeatmapError::UnknownEventValue {
        track: wire.kind,
        value: wire.value,
    };

    let kind = match track.kind() {
        TrackKind::Lighting => EventKind::Lighting(lighting_from_value(wire.value).ok_or_else(unknown_value)?),
        TrackKind::Ring => EventKind::RingTrigger,
        TrackKind::LaserSpeed => EventKind::LaserSpeed(u8::try_from(wire.value).map_err(|_| unknown_value())?),
    };

    Ok(Event {
        id: new_id(),
        track,
        beat_num: round_away_floating_point_nonsense(wire.time),
        kind,
        selected: Selection::None,
    })
}

/// Encodes every track interleaved in time order.
pub fn events_to_wire(tracks: &EventTracks) -> Vec<WireEvent> {
    tracks
        .sorted_events()
        .into_iter()
        .map(event_to_wire)
        .collect()
}

pub fn events_from_wire(wire: &[WireEvent]) -> Result<EventTracks> {
    let events = wire.iter().map(event_from_wire).collect::<Result<Vec<_>>>()?;
    Ok(EventTracks::from_events(events))
}

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{mirror_original, mirrored_id, ColorType, Event, EventKind, EventTracks, Selection, TrackId};
use crate::index::find_event;
use crate::offset::round_away_floating_point_nonsense;

/// Which paired tracks mirror each other's mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackLock {
    /// `laserLeft` and `laserRight`.
    pub lasers: bool,
    /// `laserSpeedLeft` and `laserSpeedRight`.
    pub laser_speeds: bool,
}

impl TrackLock {
    /// The locked partner of `track`, if locking applies to it.
    pub fn partner(&self, track: TrackId) -> Option<TrackId> {
        let locked = match track {
            TrackId::LaserLeft | TrackId::LaserRight => self.lasers,
            TrackId::LaserSpeedLeft | TrackId::LaserSpeedRight => self.laser_speeds,
            _ => false,
        };
        locked.then(|| track.mirror()).flatten()
    }
}

fn mirror_of(event: &Event, track: TrackId) -> Event {
    Event {
        id: event.mirrored_id(),
        track,
        ..event.clone()
    }
}

/// Ids that identify the same locked pair, seen from either side.
fn pair_ids(id: &str) -> (String, String) {
    match mirror_original(id) {
        Some(original) => (original.to_string(), id.to_string()),
        None => (id.to_string(), mirrored_id(id)),
    }
}

/// Inserts `event`. An event on an occupied beat of the same track is
/// rejected. With a lock, a copy lands on the partner track as well.
pub fn place_event(mut tracks: EventTracks, mut event: Event, lock: &TrackLock) -> EventTracks {
    event.beat_num = round_away_floating_point_nonsense(event.beat_num);
    if tracks.is_occupied(event.track, event.beat_num) {
        warn!(
            track = event.track.name(),
            beat = event.beat_num,
            "beat already holds an event, placement rejected"
        );
        return tracks;
    }

    if let Some(partner) = lock.partner(event.track) {
        if !tracks.is_occupied(partner, event.beat_num) {
            tracks.insert_sorted(mirror_of(&event, partner));
        }
    }
    tracks.insert_sorted(event);
    tracks
}

/// Like [`place_event`], but replaces whatever already sits on that beat.
pub fn drag_place_event(mut tracks: EventTracks, mut event: Event, lock: &TrackLock) -> EventTracks {
    event.beat_num = round_away_floating_point_nonsense(event.beat_num);
    let beat = event.beat_num;
    tracks.remove_where(event.track, |existing| existing.beat_num == beat);
    if let Some(partner) = lock.partner(event.track) {
        tracks.remove_where(partner, |existing| existing.beat_num == beat);
    }
    place_event(tracks, event, lock)
}

/// Removes an event by id. With a lock, the mirrored partner goes too,
/// whichever side of the pair was targeted.
pub fn delete_event(mut tracks: EventTracks, track: TrackId, id: &str, lock: &TrackLock) -> EventTracks {
    let removed = tracks.remove_where(track, |event| event.id == id);
    if removed == 0 {
        debug!(track = track.name(), id, "no event to delete");
        return tracks;
    }

    if let Some(partner) = lock.partner(track) {
        let (original, mirrored) = pair_ids(id);
        tracks.remove_where(partner, |event| event.id == original || event.id == mirrored);
    }
    tracks
}

pub fn change_laser_speed(
    mut tracks: EventTracks,
    track: TrackId,
    id: &str,
    speed: u8,
    lock: &TrackLock,
) -> EventTracks {
    let mut targets = vec![(track, id.to_string())];
    if let Some(partner) = lock.partner(track) {
        let (original, mirrored) = pair_ids(id);
        targets.push((partner, original));
        targets.push((partner, mirrored));
    }

    for (track, id) in targets {
        let Some(events) = tracks.track_mut(track) else {
            continue;
        };
        if let Some(index) = find_event(events, &id) {
            if let EventKind::LaserSpeed(_) = events[index].kind {
                events[index].kind = EventKind::LaserSpeed(speed);
            }
        }
    }
    tracks
}

/// Swaps primary and secondary on every selected lighting event.
pub fn switch_event_color(mut tracks: EventTracks) -> EventTracks {
    for event in tracks.events_mut().filter(|e| e.selected.is_selected()) {
        if let EventKind::Lighting(effect) = event.kind {
            if let Some(color) = effect.color() {
                event.kind = EventKind::Lighting(effect.with_color(ColorType::opposite(color)));
            }
        }
    }
    tracks
}

pub fn set_event_selected(mut tracks: EventTracks, track: TrackId, id: &str, selected: Selection) -> EventTracks {
    if let Some(events) = tracks.track_mut(track) {
        if let Some(index) = find_event(events, id) {
            events[index].selected = selected;
        }
    }
    tracks
}

/// Selects every event within `[start_beat, end_beat)` and clears the rest.
pub fn select_events_in_range(mut tracks: EventTracks, start_beat: f64, end_beat: f64) -> EventTracks {
    for event in tracks.events_mut() {
        event.selected = if event.beat_num >= start_beat && event.beat_num < end_beat {
            Selection::Selected
        } else {
            Selection::None
        };
    }
    tracks
}

pub fn deselect_all_events(mut tracks: EventTracks) -> EventTracks {
    tracks.events_mut().for_each(|event| event.selected = Selection::None);
    tracks
}

pub fn delete_selected_events(tracks: EventTracks) -> EventTracks {
    EventTracks::from_events(
        tracks
            .into_events()
            .into_iter()
            .filter(|event| !event.selected.is_selected()),
    )
}

fn reinsert_selected(tracks: EventTracks, transform: impl Fn(&mut Event)) -> EventTracks {
    let (mut moved, kept): (Vec<Event>, Vec<Event>) = tracks
        .into_events()
        .into_iter()
        .partition(|event| event.selected.is_selected());
    for event in &mut moved {
        transform(event);
    }

    let unlocked = TrackLock::default();
    moved
        .into_iter()
        .fold(EventTracks::from_events(kept), |tracks, event| place_event(tracks, event, &unlocked))
}

/// Moves selected events by `beats`. Events that would land on an occupied
/// beat of their track are dropped.
pub fn nudge_selected_events(tracks: EventTracks, beats: f64) -> EventTracks {
    reinsert_selected(tracks, |event| event.beat_num += beats)
}

/// Moves selected laser and laser-speed events to the opposite side.
pub fn swap_selected_events(tracks: EventTracks) -> EventTracks {
    reinsert_selected(tracks, |event| {
        if let Some(opposite) = event.track.mirror() {
            event.track = opposite;
        }
    })
}

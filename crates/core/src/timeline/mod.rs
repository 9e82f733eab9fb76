//! Derived timeline views: lit intervals per lighting track, and the cursor
//! window the history uses to decide whether an undo needs a jump.

use serde::{Deserialize, Serialize};

use crate::config::TimelineConfig;
use crate::entity::{ColorType, Event, LightingEffect, TrackId, TrackKind};
use crate::index::find_most_recent_before;

/// Beats currently on screen, `[start_beat, end_beat]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleWindow {
    pub start_beat: f64,
    pub end_beat: f64,
}

impl VisibleWindow {
    pub fn new(start_beat: f64, end_beat: f64) -> Self {
        Self { start_beat, end_beat }
    }

    /// The window the timeline shows around `cursor_beat`.
    pub fn around(cursor_beat: f64, config: &TimelineConfig) -> Self {
        Self {
            start_beat: cursor_beat - config.visible_beats_before,
            end_beat: cursor_beat + config.visible_beats_after,
        }
    }

    pub fn contains(&self, beat: f64) -> bool {
        beat >= self.start_beat && beat <= self.end_beat
    }
}

/// A contiguous span during which a lighting track is lit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundBox {
    /// Id of the event that opened the span.
    pub id: String,
    pub beat_num: f64,
    pub duration: f64,
    pub color_type: ColorType,
}

struct TentativeBox {
    id: String,
    beat_num: f64,
    color_type: ColorType,
}

impl TentativeBox {
    fn close(self, end_beat: f64) -> Option<BackgroundBox> {
        let duration = end_beat - self.beat_num;
        (duration > 0.0).then(|| BackgroundBox {
            id: self.id,
            beat_num: self.beat_num,
            duration,
            color_type: self.color_type,
        })
    }
}

/// Color a lighting track still shows at `beat`, judged from the last event
/// strictly before it. `None` means the light is off.
pub fn initial_color_before(events: &[Event], beat: f64) -> Option<ColorType> {
    match find_most_recent_before(events, beat, 0.0)?.lighting_effect()? {
        LightingEffect::On(color) | LightingEffect::Flash(color) => Some(color),
        LightingEffect::Off | LightingEffect::Fade(_) => None,
    }
}

/// Derives lit spans for one lighting track within
/// `[start_beat, start_beat + num_beats)`.
///
/// `events` must be ordered by beat; events outside the window are skipped.
/// Non-lighting tracks always produce an empty result.
pub fn background_boxes(
    events: &[Event],
    track: TrackId,
    initial_color: Option<ColorType>,
    start_beat: f64,
    num_beats: f64,
) -> Vec<BackgroundBox> {
    if track.kind() != TrackKind::Lighting {
        return Vec::new();
    }

    let end_beat = start_beat + num_beats;
    let in_window: Vec<&Event> = events
        .iter()
        .filter(|event| event.beat_num >= start_beat && event.beat_num < end_beat)
        .collect();

    let mut tentative = None;
    if let Some(color_type) = initial_color {
        if in_window.is_empty() {
            return vec![BackgroundBox {
                id: format!("initial-{}", track.name()),
                beat_num: start_beat,
                duration: num_beats,
                color_type,
            }];
        }
        tentative = Some(TentativeBox {
            id: format!("initial-{}", track.name()),
            beat_num: start_beat,
            color_type,
        });
    }

    let mut boxes = Vec::new();
    for event in in_window {
        let Some(effect) = event.lighting_effect() else {
            continue;
        };

        match (tentative.take(), effect) {
            (None, LightingEffect::On(color) | LightingEffect::Flash(color)) => {
                tentative = Some(TentativeBox {
                    id: event.id.clone(),
                    beat_num: event.beat_num,
                    color_type: color,
                });
            }
            (Some(open), LightingEffect::On(color) | LightingEffect::Flash(color)) => {
                if open.color_type == color {
                    tentative = Some(open);
                } else {
                    boxes.extend(open.close(event.beat_num));
                    tentative = Some(TentativeBox {
                        id: event.id.clone(),
                        beat_num: event.beat_num,
                        color_type: color,
                    });
                }
            }
            // A fade ends dark, so it closes the span like an off does.
            (Some(open), LightingEffect::Off | LightingEffect::Fade(_)) => {
                boxes.extend(open.close(event.beat_num));
            }
            (None, LightingEffect::Off | LightingEffect::Fade(_)) => {}
        }
    }

    if let Some(open) = tentative {
        boxes.extend(open.close(end_beat));
    }

    boxes
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: TrackId = TrackId::LaserLeft;

    fn on(beat: f64, color: ColorType) -> Event {
        Event::lighting(TRACK, beat, LightingEffect::On(color))
    }

    fn off(beat: f64) -> Event {
        Event::lighting(TRACK, beat, LightingEffect::Off)
    }

    fn spans(boxes: &[BackgroundBox]) -> Vec<(f64, f64, ColorType)> {
        boxes
            .iter()
            .map(|b| (b.beat_num, b.duration, b.color_type))
            .collect()
    }

    #[test]
    fn dark_and_empty_window_has_no_boxes() {
        assert!(background_boxes(&[], TRACK, None, 8.0, 8.0).is_empty());
    }

    #[test]
    fn lit_and_empty_window_is_one_box() {
        let boxes = background_boxes(&[], TRACK, Some(ColorType::Primary), 8.0, 8.0);
        assert_eq!(spans(&boxes), vec![(8.0, 8.0, ColorType::Primary)]);
    }

    #[test]
    fn on_then_off() {
        let events = vec![on(8.0, ColorType::Primary), off(12.0)];
        let boxes = background_boxes(&events, TRACK, None, 8.0, 8.0);
        assert_eq!(spans(&boxes), vec![(8.0, 4.0, ColorType::Primary)]);
    }

    #[test]
    fn turning_on_while_on_merges() {
        let events = vec![on(12.0, ColorType::Primary)];
        let boxes = background_boxes(&events, TRACK, Some(ColorType::Primary), 8.0, 8.0);
        assert_eq!(spans(&boxes), vec![(8.0, 8.0, ColorType::Primary)]);
    }

    #[test]
    fn color_change_splits_without_turning_off() {
        let events = vec![on(8.0, ColorType::Primary), on(12.0, ColorType::Secondary), off(14.0)];
        let boxes = background_boxes(&events, TRACK, None, 8.0, 8.0);
        assert_eq!(
            spans(&boxes),
            vec![(8.0, 4.0, ColorType::Primary), (12.0, 2.0, ColorType::Secondary)]
        );
    }

    #[test]
    fn flash_opens_and_fade_closes() {
        let events = vec![
            Event::lighting(TRACK, 9.0, LightingEffect::Flash(ColorType::Secondary)),
            Event::lighting(TRACK, 10.0, LightingEffect::Fade(ColorType::Secondary)),
        ];
        let boxes = background_boxes(&events, TRACK, None, 8.0, 8.0);
        assert_eq!(spans(&boxes), vec![(9.0, 1.0, ColorType::Secondary)]);
    }

    #[test]
    fn events_outside_the_window_are_ignored() {
        let events = vec![on(2.0, ColorType::Primary), off(20.0)];
        assert!(background_boxes(&events, TRACK, None, 8.0, 8.0).is_empty());
    }

    #[test]
    fn ring_tracks_short_circuit() {
        let events = vec![Event::ring(TrackId::LargeRing, 9.0)];
        let boxes = background_boxes(&events, TrackId::LargeRing, Some(ColorType::Primary), 8.0, 8.0);
        assert!(boxes.is_empty());
    }

    #[test]
    fn initial_color_comes_from_the_previous_event() {
        let events = vec![on(2.0, ColorType::Secondary), off(4.0), on(6.0, ColorType::Primary)];
        assert_eq!(initial_color_before(&events, 8.0), Some(ColorType::Primary));
        assert_eq!(initial_color_before(&events, 5.0), None);
        assert_eq!(initial_color_before(&events, 6.0), None);
        assert_eq!(initial_color_before(&events, 3.0), Some(ColorType::Secondary));
    }

    #[test]
    fn window_around_cursor() {
        let window = VisibleWindow::around(10.0, &TimelineConfig::default());
        assert!(window.contains(8.0));
        assert!(window.contains(26.0));
        assert!(!window.contains(7.5));
    }
}

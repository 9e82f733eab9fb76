//! Beat/millisecond conversion and global time shifting.
//!
//! On disk, entity times are relative to the start of the audio file. In the
//! editor they are relative to a user-chosen offset, so every load unshifts
//! and every save shifts by the same amount of beats.

/// Number of decimal steps per beat that survive [`round_away_floating_point_nonsense`].
///
/// This is the finest snap increment the editor allows. Anything below it is
/// floating-point drift from repeated shift/unshift cycles.
pub const ROUNDING_STEPS_PER_BEAT: f64 = 1_000_000.0;

pub fn beats_to_ms(beats: f64, bpm: f64) -> f64 {
    beats / bpm * 60_000.0
}

pub fn ms_to_beats(ms: f64, bpm: f64) -> f64 {
    ms / 60_000.0 * bpm
}

/// Rounds to [`ROUNDING_STEPS_PER_BEAT`] precision and coerces `-0` to `0`.
pub fn round_away_floating_point_nonsense(value: f64) -> f64 {
    let rounded = (value * ROUNDING_STEPS_PER_BEAT).round() / ROUNDING_STEPS_PER_BEAT;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Anything positioned on the beat grid.
pub trait Timed {
    fn beat(&self) -> f64;
    fn set_beat(&mut self, beat: f64);
}

/// Moves every entity later by `offset_ms`, converting editor time to file time.
pub fn shift_by_offset<T: Timed>(entities: Vec<T>, offset_ms: f64, bpm: f64) -> Vec<T> {
    move_by_beats(entities, ms_to_beats(offset_ms, bpm))
}

/// Moves every entity earlier by `offset_ms`, converting file time to editor time.
pub fn unshift_by_offset<T: Timed>(entities: Vec<T>, offset_ms: f64, bpm: f64) -> Vec<T> {
    move_by_beats(entities, -ms_to_beats(offset_ms, bpm))
}

fn move_by_beats<T: Timed>(mut entities: Vec<T>, delta: f64) -> Vec<T> {
    for entity in &mut entities {
        let beat = round_away_floating_point_nonsense(entity.beat() + delta);
        entity.set_beat(beat);
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tick(f64);

    impl Timed for Tick {
        fn beat(&self) -> f64 {
            self.0
        }

        fn set_beat(&mut self, beat: f64) {
            self.0 = beat;
        }
    }

    #[test]
    fn conversions_are_inverse() {
        let ms = beats_to_ms(7.25, 128.0);
        assert!((ms_to_beats(ms, 128.0) - 7.25).abs() < 1e-9);
        assert!((beats_to_ms(4.0, 120.0) - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn negative_zero_is_coerced() {
        let value = round_away_floating_point_nonsense(-0.000_000_1);
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
    }

    #[test]
    fn rounding_hides_binary_drift() {
        assert_eq!(round_away_floating_point_nonsense(0.1 + 0.2), 0.3);
    }

    #[test]
    fn shift_then_unshift_is_idempotent() {
        let original = vec![Tick(0.0), Tick(1.5), Tick(3.333), Tick(17.125)];
        let mut ticks = original.clone();

        for _ in 0..50 {
            ticks = shift_by_offset(ticks, 173.0, 97.0);
            ticks = unshift_by_offset(ticks, 173.0, 97.0);
        }

        for (tick, expected) in ticks.iter().zip(&original) {
            assert!((tick.0 - expected.0).abs() < 1e-6, "{tick:?} drifted from {expected:?}");
        }
    }

    #[test]
    fn shift_adds_offset_in_beats() {
        let ticks = shift_by_offset(vec![Tick(2.0)], 500.0, 120.0);
        assert_eq!(ticks, vec![Tick(3.0)]);
    }
}

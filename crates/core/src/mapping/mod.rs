//! Mapping Extensions grid transform.
//!
//! The mod lets a song use an N-column by M-row grid with custom cell sizes.
//! Editor notes keep their raw grid coordinates; on export they are moved
//! into the engine's coordinate space and, when they fall off the standard
//! 4x3 cells, packed into the "precision" range of the same wire fields.

use serde::{Deserialize, Serialize};

use crate::entity::Note;
use crate::offset::round_away_floating_point_nonsense;

/// Columns in the engine's natural grid.
pub const NATURAL_COLS: f64 = 4.0;
/// Rows in the engine's natural grid.
pub const NATURAL_ROWS: f64 = 3.0;

/// Centering constants. `a = (4 - 1) / -2` and `b = -a` make the transform the
/// identity for a 4-column grid with unit column width.
const CENTER_A: f64 = (NATURAL_COLS - 1.0) / -2.0;
const CENTER_B: f64 = -CENTER_A;

/// Precision values are scaled by this factor and pushed this far away from
/// zero so that they never collide with the plain 0..=3 range.
pub const PRECISION_SCALE: f64 = 1000.0;
pub const PRECISION_OFFSET: f64 = 1000.0;

/// Grid settings stored with a song when the mod is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingExtensionsSettings {
    pub is_enabled: bool,
    pub num_cols: u32,
    pub num_rows: u32,
    pub col_width: f64,
    pub row_height: f64,
}

impl Default for MappingExtensionsSettings {
    fn default() -> Self {
        Self {
            is_enabled: false,
            num_cols: 4,
            num_rows: 3,
            col_width: 1.0,
            row_height: 1.0,
        }
    }
}

impl MappingExtensionsSettings {
    /// Settings for an enabled grid of the given shape.
    pub fn enabled(num_cols: u32, num_rows: u32, col_width: f64, row_height: f64) -> Self {
        Self {
            is_enabled: true,
            num_cols,
            num_rows,
            col_width,
            row_height,
        }
    }

    fn centering(&self) -> f64 {
        (f64::from(self.num_cols) - NATURAL_COLS) / 2.0
    }

    fn offset(&self) -> f64 {
        CENTER_A * self.col_width + CENTER_B
    }

    /// Raw editor column to engine column.
    pub fn effective_col(&self, raw_index: f64) -> f64 {
        self.col_width * (raw_index - self.centering()) + self.offset()
    }

    pub fn raw_col(&self, effective_index: f64) -> f64 {
        (effective_index - self.offset()) / self.col_width + self.centering()
    }

    /// Raw editor row to engine row. Rows grow from the floor, so there is no
    /// centering term.
    pub fn effective_row(&self, raw_row: f64) -> f64 {
        raw_row * self.row_height
    }

    pub fn raw_row(&self, effective_row: f64) -> f64 {
        effective_row / self.row_height
    }
}

/// Packs a coordinate into the precision range: `v * 1000 ± 1000`.
pub fn pack_precision(value: f64) -> f64 {
    let packed = if value < 0.0 {
        value * PRECISION_SCALE - PRECISION_OFFSET
    } else {
        value * PRECISION_SCALE + PRECISION_OFFSET
    };
    packed.round()
}

/// Inverse of [`pack_precision`]. Values inside `(-1000, 1000)` are plain
/// coordinates and pass through untouched.
pub fn unpack_precision(value: f64) -> f64 {
    if value >= PRECISION_OFFSET {
        (value - PRECISION_OFFSET) / PRECISION_SCALE
    } else if value <= -PRECISION_OFFSET {
        (value + PRECISION_OFFSET) / PRECISION_SCALE
    } else {
        value
    }
}

fn encode_coordinate(effective: f64, natural_max: f64) -> f64 {
    let plain = effective.fract() == 0.0 && (0.0..natural_max).contains(&effective);
    if plain {
        effective
    } else {
        pack_precision(effective)
    }
}

/// Moves notes from the editor grid into wire coordinates.
pub fn notes_to_wire_grid(notes: Vec<Note>, settings: &MappingExtensionsSettings) -> Vec<Note> {
    notes
        .into_iter()
        .map(|mut note| {
            let col = round_away_floating_point_nonsense(settings.effective_col(note.line_index));
            let row = round_away_floating_point_nonsense(settings.effective_row(note.line_layer));
            note.line_index = encode_coordinate(col, NATURAL_COLS);
            note.line_layer = encode_coordinate(row, NATURAL_ROWS);
            note
        })
        .collect()
}

/// Moves notes from wire coordinates back onto the editor grid.
pub fn notes_from_wire_grid(notes: Vec<Note>, settings: &MappingExtensionsSettings) -> Vec<Note> {
    notes
        .into_iter()
        .map(|mut note| {
            let col = unpack_precision(note.line_index);
            let row = unpack_precision(note.line_layer);
            note.line_index = round_away_floating_point_nonsense(settings.raw_col(col));
            note.line_layer = round_away_floating_point_nonsense(settings.raw_row(row));
            note
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CutDirection, NoteColor, NoteKind};

    fn note(index: f64, layer: f64) -> Note {
        Note::new(1.0, index, layer, NoteKind::Block(NoteColor::Red), CutDirection::Up)
    }

    #[test]
    fn natural_grid_is_identity() {
        let settings = MappingExtensionsSettings::enabled(4, 3, 1.0, 1.0);
        for raw in [0.0, 1.0, 2.0, 3.0] {
            assert_eq!(settings.effective_col(raw), raw);
        }

        let notes = notes_to_wire_grid(vec![note(2.0, 1.0)], &settings);
        assert_eq!((notes[0].line_index, notes[0].line_layer), (2.0, 1.0));
    }

    #[test]
    fn wide_grid_spills_past_the_natural_lanes() {
        let settings = MappingExtensionsSettings::enabled(6, 3, 1.0, 1.0);
        assert_eq!(settings.effective_col(0.0), -1.0);
        assert_eq!(settings.effective_col(5.0), 4.0);

        let notes = notes_to_wire_grid(vec![note(0.0, 0.0), note(5.0, 0.0)], &settings);
        assert_eq!(notes[0].line_index, -2000.0);
        assert_eq!(notes[1].line_index, 5000.0);
    }

    #[test]
    fn narrow_columns_stay_centered() {
        let settings = MappingExtensionsSettings::enabled(4, 3, 0.5, 1.0);
        assert_eq!(settings.effective_col(0.0), 0.75);
        assert_eq!(settings.effective_col(3.0), 2.25);
    }

    #[test]
    fn grid_round_trip() {
        let settings = MappingExtensionsSettings::enabled(7, 5, 0.75, 0.6);
        let original: Vec<Note> = (0..7).map(|i| note(f64::from(i), f64::from(i % 5))).collect();

        let wire = notes_to_wire_grid(original.clone(), &settings);
        let back = notes_from_wire_grid(wire, &settings);

        for (a, b) in original.iter().zip(&back) {
            assert!((a.line_index - b.line_index).abs() < 1e-3, "{a:?} vs {b:?}");
            assert!((a.line_layer - b.line_layer).abs() < 1e-3, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn precision_packing_is_signed() {
        assert_eq!(pack_precision(-1.0), -2000.0);
        assert_eq!(pack_precision(0.0), 1000.0);
        assert_eq!(pack_precision(1.5), 2500.0);
        assert_eq!(unpack_precision(-2000.0), -1.0);
        assert_eq!(unpack_precision(2500.0), 1.5);
        assert_eq!(unpack_precision(3.0), 3.0);
    }
}

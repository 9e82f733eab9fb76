use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the editor core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub timeline: TimelineConfig,
    pub grid: GridConfig,
}

impl EditorConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Configuration for both undo/redo stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of past snapshots retained per stack.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Configuration for the timeline view collaborating with this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// How far ahead of the audio the visual state runs, in beats.
    pub lookahead_beats: f64,
    /// Beats visible behind the cursor.
    pub visible_beats_before: f64,
    /// Beats visible ahead of the cursor.
    pub visible_beats_after: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            lookahead_beats: 0.0,
            visible_beats_before: 2.0,
            visible_beats_after: 16.0,
        }
    }
}

/// Placement grid used when Mapping Extensions is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub num_cols: u32,
    pub num_rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            num_cols: 4,
            num_rows: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config = EditorConfig::from_json_slice(br#"{ "history": { "capacity": 8 } }"#).unwrap();

        assert_eq!(config.history.capacity, 8);
        assert_eq!(config.timeline, TimelineConfig::default());
        assert_eq!(config.grid.num_cols, 4);
    }

    #[test]
    fn empty_object_is_default() {
        let config = EditorConfig::from_json_slice(b"{}").unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}

//! Flat numeric records exactly as the game engine reads them.

use serde::{Deserialize, Deserializer, Serialize};

/// Integer fields are occasionally written as floats by other editors.
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round() as i64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNote {
    #[serde(rename = "_time")]
    pub time: f64,
    #[serde(rename = "_lineIndex", deserialize_with = "lenient_int")]
    pub line_index: i64,
    #[serde(rename = "_lineLayer", deserialize_with = "lenient_int")]
    pub line_layer: i64,
    #[serde(rename = "_type", deserialize_with = "lenient_int")]
    pub kind: i64,
    #[serde(rename = "_cutDirection", deserialize_with = "lenient_int")]
    pub cut_direction: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireObstacle {
    #[serde(rename = "_time")]
    pub time: f64,
    #[serde(rename = "_lineIndex", deserialize_with = "lenient_int")]
    pub line_index: i64,
    #[serde(rename = "_type", deserialize_with = "lenient_int")]
    pub kind: i64,
    /// Negative for fast walls.
    #[serde(rename = "_duration")]
    pub duration: f64,
    #[serde(rename = "_width", deserialize_with = "lenient_int")]
    pub width: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "_time")]
    pub time: f64,
    #[serde(rename = "_type", deserialize_with = "lenient_int")]
    pub kind: i64,
    #[serde(rename = "_value", deserialize_with = "lenient_int")]
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireBookmark {
    #[serde(rename = "_time")]
    pub time: f64,
    #[serde(rename = "_name")]
    pub name: String,
    #[serde(rename = "_color", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

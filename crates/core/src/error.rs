/// Result alias that carries the custom [`BeatmapError`] type.
pub type Result<T> = std::result::Result<T, BeatmapError>;

/// Common error type for the core crate.
///
/// Only malformed input surfaces as an error. Lookup misses, rejected inserts
/// and history underflow are silent no-ops and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum BeatmapError {
    /// An event referenced a `_type` that is not one of the supported tracks.
    #[error("unrecognised event track id {0}")]
    UnknownTrack(i64),
    /// An event carried a `_value` its track cannot represent.
    #[error("unrecognised event value {value} on track {track}")]
    UnknownEventValue { track: i64, value: i64 },
    /// An obstacle `_type` that is neither a wall, a ceiling nor a packed
    /// extended wall.
    #[error("unrecognised obstacle type {0}")]
    UnknownObstacleType(i64),
    /// A note `_type` that is neither a block color nor a mine.
    #[error("unrecognised note type {0}")]
    UnknownNoteType(i64),
    #[error("unrecognised cut direction {0}")]
    UnknownCutDirection(i64),
    /// The info manifest is missing data required for the requested schema.
    #[error("invalid info manifest: {0}")]
    InvalidManifest(String),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

impl BeatmapError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Returns `true` when the error comes from a record that could not be
    /// decoded, as opposed to an IO or serialisation failure.
    pub fn is_malformed_record(&self) -> bool {
        matches!(
            self,
            Self::UnknownTrack(_)
                | Self::UnknownEventValue { .. }
                | Self::UnknownObstacleType(_)
                | Self::UnknownNoteType(_)
                | Self::UnknownCutDirection(_)
        )
    }
}

impl From<&str> for BeatmapError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for BeatmapError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

//! Core library for the beatmap editor.
//!
//! Each module owns one concern of the editing pipeline: translating between
//! the game's flat wire records and a typed model (codec, mapping, offset),
//! mutating that model (edit, index), tracking undo history, and deriving
//! timeline views. The session module wires them together per song.

pub mod beatmap;
pub mod codec;
pub mod config;
pub mod edit;
pub mod entity;
pub mod error;
pub mod history;
pub mod index;
pub mod info;
pub mod mapping;
pub mod offset;
pub mod session;
pub mod storage;
pub mod timeline;

pub use beatmap::{decode_beatmap, encode_beatmap, encode_legacy_beatmap, Beatmap, LegacyHeader};
pub use config::{EditorConfig, GridConfig, HistoryConfig, TimelineConfig};
pub use edit::{Clipboard, ObstacleDraft, TrackLock};
pub use entity::{
    Bookmark, BookmarkMap, ColorType, CutDirection, Event, EventKind, EventTracks, LightingEffect,
    Note, NoteColor, NoteKey, NoteKind, NotesView, Obstacle, ObstacleShape, Selection, TrackId,
};
pub use error::{BeatmapError, Result};
pub use history::{ActionKind, History, HistoryStep};
pub use info::{Difficulty, DifficultyInfo, InfoManifest, ModSettings};
pub use mapping::MappingExtensionsSettings;
pub use session::{EditSession, SessionContext};
pub use storage::{BlobStore, DirStore, MemoryStore};
pub use timeline::{BackgroundBox, VisibleWindow};

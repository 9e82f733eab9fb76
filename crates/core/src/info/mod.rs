//! Song-level `info.dat` manifest.
//!
//! Two layouts exist. v2 nests difficulties under beatmap sets and uses
//! underscore-prefixed keys; v1 is flat and camelCase. The editor's own
//! settings ride along in `_customData` so a v2 manifest round-trips.

use serde::{Deserialize, Serialize};

use crate::mapping::MappingExtensionsSettings;
use crate::{BeatmapError, Result};

pub const INFO_VERSION: &str = "2.0.0";
pub const MAPPING_EXTENSIONS_REQUIREMENT: &str = "Mapping Extensions";

const CHARACTERISTIC: &str = "Standard";
const DEFAULT_NOTE_JUMP_SPEED: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Expert,
    ExpertPlus,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Expert,
        Difficulty::ExpertPlus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
            Self::ExpertPlus => "ExpertPlus",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|difficulty| difficulty.name() == name)
    }

    pub fn rank(self) -> u32 {
        match self {
            Self::Easy => 1,
            Self::Normal => 3,
            Self::Hard => 5,
            Self::Expert => 7,
            Self::ExpertPlus => 9,
        }
    }

    /// Name of the difficulty file inside the song folder.
    pub fn filename(self) -> String {
        format!("{}.dat", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyInfo {
    pub difficulty: Difficulty,
    pub note_jump_speed: f64,
    pub start_beat_offset: f64,
}

/// Color channels in `0.0..=1.0`, as the engine expects them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |range: std::ops::Range<usize>| -> Result<f64> {
            digits
                .get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .map(|value| f64::from(value) / 255.0)
                .ok_or_else(|| BeatmapError::InvalidManifest(format!("bad hex color `{hex}`")))
        };
        if digits.len() != 6 {
            return Err(BeatmapError::InvalidManifest(format!("bad hex color `{hex}`")));
        }

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        let byte = |channel: f64| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomColors {
    pub is_enabled: bool,
    pub color_left: String,
    pub color_right: String,
    pub env_color_left: String,
    pub env_color_right: String,
    pub obstacle_color: String,
}

impl Default for CustomColors {
    fn default() -> Self {
        Self {
            is_enabled: false,
            color_left: "#f21212".to_string(),
            color_right: "#006cff".to_string(),
            env_color_left: "#f21212".to_string(),
            env_color_right: "#006cff".to_string(),
            obstacle_color: "#f21212".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModSettings {
    pub mapping_extensions: MappingExtensionsSettings,
    pub custom_colors: CustomColors,
}

/// Typed song metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoManifest {
    pub name: String,
    pub sub_name: String,
    pub artist_name: String,
    pub mapper_name: String,
    pub bpm: f64,
    /// Editor offset in milliseconds.
    pub offset_ms: f64,
    pub preview_start_time: f64,
    pub preview_duration: f64,
    pub song_filename: String,
    pub cover_art_filename: String,
    pub environment: String,
    pub difficulties: Vec<DifficultyInfo>,
    pub mod_settings: ModSettings,
}

impl Default for InfoManifest {
    fn default() -> Self {
        Self {
            name: String::new(),
            sub_name: String::new(),
            artist_name: String::new(),
            mapper_name: String::new(),
            bpm: 120.0,
            offset_ms: 0.0,
            preview_start_time: 12.0,
            preview_duration: 10.0,
            song_filename: "song.egg".to_string(),
            cover_art_filename: "cover.jpg".to_string(),
            environment: "DefaultEnvironment".to_string(),
            difficulties: Vec::new(),
            mod_settings: ModSettings::default(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct V2EditorSettings {
    #[serde(rename = "modSettings", default)]
    mod_settings: ModSettings,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct V2CustomData {
    #[serde(rename = "_editorOffset", default)]
    editor_offset: f64,
    #[serde(rename = "_editorSettings", default, skip_serializing_if = "Option::is_none")]
    editor_settings: Option<V2EditorSettings>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct V2DifficultyCustomData {
    #[serde(rename = "_requirements", default, skip_serializing_if = "Vec::is_empty")]
    requirements: Vec<String>,
    #[serde(rename = "_colorLeft", default, skip_serializing_if = "Option::is_none")]
    color_left: Option<RgbColor>,
    #[serde(rename = "_colorRight", default, skip_serializing_if = "Option::is_none")]
    color_right: Option<RgbColor>,
    #[serde(rename = "_envColorLeft", default, skip_serializing_if = "Option::is_none")]
    env_color_left: Option<RgbColor>,
    #[serde(rename = "_envColorRight", default, skip_serializing_if = "Option::is_none")]
    env_color_right: Option<RgbColor>,
    #[serde(rename = "_obstacleColor", default, skip_serializing_if = "Option::is_none")]
    obstacle_color: Option<RgbColor>,
}

#[derive(Debug, Serialize, Deserialize)]
struct V2Difficulty {
    #[serde(rename = "_difficulty")]
    difficulty: String,
    #[serde(rename = "_difficultyRank")]
    rank: u32,
    #[serde(rename = "_beatmapFilename")]
    filename: String,
    #[serde(rename = "_noteJumpMovementSpeed", default)]
    note_jump_speed: f64,
    #[serde(rename = "_noteJumpStartBeatOffset", default)]
    start_beat_offset: f64,
    #[serde(rename = "_customData", default)]
    custom_data: V2DifficultyCustomData,
}

#[derive(Debug, Serialize, Deserialize)]
struct V2BeatmapSet {
    #[serde(rename = "_beatmapCharacteristicName")]
    characteristic: String,
    #[serde(rename = "_difficultyBeatmaps", default)]
    difficulties: Vec<V2Difficulty>,
}

#[derive(Debug, Serialize, Deserialize)]
struct V2Info {
    #[serde(rename = "_version")]
    version: String,
    #[serde(rename = "_songName")]
    song_name: String,
    #[serde(rename = "_songSubName", default)]
    song_sub_name: String,
    #[serde(rename = "_songAuthorName", default)]
    song_author_name: String,
    #[serde(rename = "_levelAuthorName", default)]
    level_author_name: String,
    #[serde(rename = "_beatsPerMinute")]
    beats_per_minute: f64,
    #[serde(rename = "_songTimeOffset", default)]
    song_time_offset: f64,
    #[serde(rename = "_shuffle", default)]
    shuffle: f64,
    #[serde(rename = "_shufflePeriod", default)]
    shuffle_period: f64,
    #[serde(rename = "_previewStartTime", default)]
    preview_start_time: f64,
    #[serde(rename = "_previewDuration", default)]
    preview_duration: f64,
    #[serde(rename = "_songFilename", default)]
    song_filename: String,
    #[serde(rename = "_coverImageFilename", default)]
    cover_image_filename: String,
    #[serde(rename = "_environmentName", default)]
    environment_name: String,
    #[serde(rename = "_customData", default)]
    custom_data: V2CustomData,
    #[serde(rename = "_difficultyBeatmapSets", default)]
    beatmap_sets: Vec<V2BeatmapSet>,
}

fn difficulty_custom_data(mods: &ModSettings) -> Result<V2DifficultyCustomData> {
    let mut data = V2DifficultyCustomData::default();
    if mods.mapping_extensions.is_enabled {
        data.requirements.push(MAPPING_EXTENSIONS_REQUIREMENT.to_string());
    }
    let colors = &mods.custom_colors;
    if colors.is_enabled {
        data.color_left = Some(RgbColor::from_hex(&colors.color_left)?);
        data.color_right = Some(RgbColor::from_hex(&colors.color_right)?);
        data.env_color_left = Some(RgbColor::from_hex(&colors.env_color_left)?);
        data.env_color_right = Some(RgbColor::from_hex(&colors.env_color_right)?);
        data.obstacle_color = Some(RgbColor::from_hex(&colors.obstacle_color)?);
    }
    Ok(data)
}

/// Settings recovered from a difficulty when the manifest was written by
/// another tool and carries no editor settings.
fn mods_from_difficulty(data: &V2DifficultyCustomData) -> ModSettings {
    let mut mods = ModSettings::default();
    mods.mapping_extensions.is_enabled = data
        .requirements
        .iter()
        .any(|requirement| requirement == MAPPING_EXTENSIONS_REQUIREMENT);

    if let (Some(left), Some(right)) = (data.color_left, data.color_right) {
        let colors = &mut mods.custom_colors;
        colors.is_enabled = true;
        colors.color_left = left.to_hex();
        colors.color_right = right.to_hex();
        colors.env_color_left = data.env_color_left.unwrap_or(left).to_hex();
        colors.env_color_right = data.env_color_right.unwrap_or(right).to_hex();
        colors.obstacle_color = data.obstacle_color.unwrap_or(left).to_hex();
    }
    mods
}

impl InfoManifest {
    pub fn to_v2_json(&self) -> Result<Vec<u8>> {
        if self.difficulties.is_empty() {
            return Err(BeatmapError::InvalidManifest("song has no difficulties".into()));
        }

        let difficulties = self
            .difficulties
            .iter()
            .map(|info| {
                Ok(V2Difficulty {
                    difficulty: info.difficulty.name().to_string(),
                    rank: info.difficulty.rank(),
                    filename: info.difficulty.filename(),
                    note_jump_speed: info.note_jump_speed,
                    start_beat_offset: info.start_beat_offset,
                    custom_data: difficulty_custom_data(&self.mod_settings)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let info = V2Info {
            version: INFO_VERSION.to_string(),
            song_name: self.name.clone(),
            song_sub_name: self.sub_name.clone(),
            song_author_name: self.artist_name.clone(),
            level_author_name: self.mapper_name.clone(),
            beats_per_minute: self.bpm,
            song_time_offset: 0.0,
            shuffle: 0.0,
            shuffle_period: 0.5,
            preview_start_time: self.preview_start_time,
            preview_duration: self.preview_duration,
            song_filename: self.song_filename.clone(),
            cover_image_filename: self.cover_art_filename.clone(),
            environment_name: self.environment.clone(),
            custom_data: V2CustomData {
                editor_offset: self.offset_ms,
                editor_settings: Some(V2EditorSettings {
                    mod_settings: self.mod_settings.clone(),
                }),
            },
            beatmap_sets: vec![V2BeatmapSet {
                characteristic: CHARACTERISTIC.to_string(),
                difficulties,
            }],
        };
        Ok(serde_json::to_vec_pretty(&info)?)
    }

    pub fn from_v2_json(bytes: &[u8]) -> Result<Self> {
        let info: V2Info = serde_json::from_slice(bytes)?;

        let standard: Vec<&V2Difficulty> = info
            .beatmap_sets
            .iter()
            .filter(|set| set.characteristic == CHARACTERISTIC)
            .flat_map(|set| set.difficulties.iter())
            .collect();

        let difficulties = standard
            .iter()
            .map(|entry| {
                let difficulty = Difficulty::from_name(&entry.difficulty).ok_or_else(|| {
                    BeatmapError::InvalidManifest(format!("unknown difficulty `{}`", entry.difficulty))
                })?;
                Ok(DifficultyInfo {
                    difficulty,
                    note_jump_speed: entry.note_jump_speed,
                    start_beat_offset: entry.start_beat_offset,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mod_settings = match info.custom_data.editor_settings {
            Some(settings) => settings.mod_settings,
            None => standard
                .first()
                .map(|entry| mods_from_difficulty(&entry.custom_data))
                .unwrap_or_default(),
        };

        Ok(Self {
            name: info.song_name,
            sub_name: info.song_sub_name,
            artist_name: info.song_author_name,
            mapper_name: info.level_author_name,
            bpm: info.beats_per_minute,
            offset_ms: info.custom_data.editor_offset,
            preview_start_time: info.preview_start_time,
            preview_duration: info.preview_duration,
            song_filename: info.song_filename,
            cover_art_filename: info.cover_image_filename,
            environment: info.environment_name,
            difficulties,
            mod_settings,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1DifficultyLevel {
    difficulty: String,
    difficulty_rank: u32,
    audio_path: String,
    json_path: String,
    #[serde(default)]
    offset: f64,
    #[serde(default)]
    old_offset: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Info {
    song_name: String,
    #[serde(default)]
    song_sub_name: String,
    #[serde(default)]
    author_name: String,
    beats_per_minute: f64,
    #[serde(default)]
    preview_start_time: f64,
    #[serde(default)]
    preview_duration: f64,
    #[serde(default)]
    cover_image_path: String,
    #[serde(default)]
    environment_name: String,
    #[serde(default)]
    difficulty_levels: Vec<V1DifficultyLevel>,
}

impl InfoManifest {
    /// Flat layout. It has no room for the mapper, note jump settings or
    /// mod settings.
    pub fn to_v1_json(&self) -> Result<Vec<u8>> {
        if self.difficulties.is_empty() {
            return Err(BeatmapError::InvalidManifest("song has no difficulties".into()));
        }

        let info = V1Info {
            song_name: self.name.clone(),
            song_sub_name: self.sub_name.clone(),
            author_name: self.artist_name.clone(),
            beats_per_minute: self.bpm,
            preview_start_time: self.preview_start_time,
            preview_duration: self.preview_duration,
            cover_image_path: self.cover_art_filename.clone(),
            environment_name: self.environment.clone(),
            difficulty_levels: self
                .difficulties
                .iter()
                .map(|info| V1DifficultyLevel {
                    difficulty: info.difficulty.name().to_string(),
                    difficulty_rank: info.difficulty.rank(),
                    audio_path: self.song_filename.clone(),
                    json_path: format!("{}.json", info.difficulty.name()),
                    offset: self.offset_ms,
                    old_offset: self.offset_ms,
                })
                .collect(),
        };
        Ok(serde_json::to_vec_pretty(&info)?)
    }

    pub fn from_v1_json(bytes: &[u8]) -> Result<Self> {
        let info: V1Info = serde_json::from_slice(bytes)?;
        let first = info.difficulty_levels.first();

        let difficulties = info
            .difficulty_levels
            .iter()
            .map(|level| {
                let difficulty = Difficulty::from_name(&level.difficulty).ok_or_else(|| {
                    BeatmapError::InvalidManifest(format!("unknown difficulty `{}`", level.difficulty))
                })?;
                Ok(DifficultyInfo {
                    difficulty,
                    note_jump_speed: DEFAULT_NOTE_JUMP_SPEED,
                    start_beat_offset: 0.0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let defaults = Self::default();
        Ok(Self {
            name: info.song_name,
            sub_name: info.song_sub_name,
            artist_name: info.author_name,
            mapper_name: String::new(),
            bpm: info.beats_per_minute,
            offset_ms: first.map(|level| level.offset).unwrap_or(0.0),
            preview_start_time: info.preview_start_time,
            preview_duration: info.preview_duration,
            song_filename: first
                .map(|level| level.audio_path.clone())
                .unwrap_or(defaults.song_filename),
            cover_art_filename: info.cover_image_path,
            environment: info.environment_name,
            difficulties,
            mod_settings: ModSettings::default(),
        })
    }
}

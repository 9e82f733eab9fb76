use std::path::{Path, PathBuf};

use beatmap_editor_core::{
    BeatmapError, EditSession, EditorConfig, InfoManifest, ModSettings, SessionContext, TrackId,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beatmap_editor_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::from_json_file(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Inspect { map, info } => run_inspect(config, &map, info.as_deref()),
        Commands::Lights {
            map,
            track,
            start,
            beats,
            timing,
        } => run_lights(config, &map, &track, start, beats, timing),
        Commands::Convert {
            map,
            output,
            legacy,
            njs,
            info,
            timing,
        } => run_convert(config, &map, &output, legacy, njs, info.as_deref(), timing),
    }
}

fn read_mods(info: Option<&Path>) -> beatmap_editor_core::Result<ModSettings> {
    let Some(path) = info else {
        return Ok(ModSettings::default());
    };
    let manifest = InfoManifest::from_v2_json(&std::fs::read(path)?)?;
    tracing::info!(song = %manifest.name, bpm = manifest.bpm, "read info manifest");
    Ok(manifest.mod_settings)
}

fn open_session(
    config: EditorConfig,
    map: &Path,
    info: Option<&Path>,
    ctx: &SessionContext,
) -> beatmap_editor_core::Result<EditSession> {
    let mut session = EditSession::new(config, read_mods(info)?);
    session.load(&std::fs::read(map)?, ctx)?;
    Ok(session)
}

fn run_inspect(config: EditorConfig, map: &Path, info: Option<&Path>) -> beatmap_editor_core::Result<()> {
    tracing::info!(?map, "inspecting difficulty");

    let session = open_session(config, map, info, &SessionContext::new(120.0, 0.0))?;
    let view = session.notes();
    println!("notes: {}", view.notes.len());
    println!("obstacles: {}", view.obstacles.len());
    println!("bookmarks: {}", session.bookmarks().len());
    println!("events: {}", session.events().len());
    for track in TrackId::ALL {
        let count = session.events().track(track).len();
        if count > 0 {
            println!("  {}: {count}", track.name());
        }
    }
    Ok(())
}

fn run_lights(
    config: EditorConfig,
    map: &Path,
    track: &str,
    start: f64,
    beats: f64,
    timing: Timing,
) -> beatmap_editor_core::Result<()> {
    let track = TrackId::from_name(track)
        .ok_or_else(|| BeatmapError::msg(format!("unknown track `{track}`")))?;
    let session = open_session(config, map, None, &timing.context())?;

    for lit in session.background_boxes(track, start, beats) {
        println!(
            "{:>10.3} +{:<8.3} {:?} ({})",
            lit.beat_num, lit.duration, lit.color_type, lit.id
        );
    }
    Ok(())
}

fn run_convert(
    config: EditorConfig,
    map: &Path,
    output: &Path,
    legacy: bool,
    njs: f64,
    info: Option<&Path>,
    timing: Timing,
) -> beatmap_editor_core::Result<()> {
    tracing::info!(?map, ?output, legacy, "converting difficulty");

    let ctx = timing.context();
    let session = open_session(config, map, info, &ctx)?;
    let bytes = if legacy {
        session.save_legacy(&ctx, njs)?
    } else {
        session.save(&ctx)?
    };
    std::fs::write(output, bytes)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Beatmap editor tooling", long_about = None)]
struct Cli {
    /// Editor configuration file (JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct Timing {
    /// Song tempo.
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,
    /// Editor offset in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    offset_ms: f64,
}

impl Timing {
    fn context(self) -> SessionContext {
        SessionContext::new(self.bpm, self.offset_ms)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print entity counts per class and per event track.
    Inspect {
        /// Difficulty file to read.
        map: PathBuf,
        /// Song manifest providing mod settings.
        #[arg(long)]
        info: Option<PathBuf>,
    },
    /// Print the lit spans of one lighting track.
    Lights {
        map: PathBuf,
        /// Track name, e.g. `laserLeft`.
        #[arg(long)]
        track: String,
        /// First beat of the window, in editor time.
        #[arg(long, default_value_t = 0.0)]
        start: f64,
        #[arg(long, default_value_t = 16.0)]
        beats: f64,
        #[command(flatten)]
        timing: Timing,
    },
    /// Round-trip a difficulty through the editing model.
    Convert {
        map: PathBuf,
        output: PathBuf,
        /// Write the 1.5 layout instead of v2.
        #[arg(long)]
        legacy: bool,
        /// Note jump speed for the legacy header.
        #[arg(long, default_value_t = 10.0)]
        njs: f64,
        #[arg(long)]
        info: Option<PathBuf>,
        #[command(flatten)]
        timing: Timing,
    },
}

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod clock;
mod constants;
mod error;
mod ffmpeg;
mod media;
mod presenter;
mod scene;
mod stage;
mod state;
mod text;
mod texture_loader;

use crate::constants::*;
use crate::presenter::{FrameOutcome, Presenter};
use crate::scene::{default_scenes, load_scenes};
use crate::stage::{Stage, StageOptions};

#[derive(Parser, Debug)]
#[command(name = "scene-player", version, about = "Plays a scripted slideshow of images and videos with animated captions")]
struct Cli {
    /// JSON scene list; the built-in demo scenes are used when omitted.
    #[arg(long)]
    scenes: Option<PathBuf>,

    /// Encode every presented frame into this MP4 (requires `ffmpeg` on PATH).
    #[arg(long)]
    record: Option<PathBuf>,

    /// Target frames per second.
    #[arg(long, default_value_t = FPS)]
    fps: u32,

    /// Close the window once the last scene has ended.
    #[arg(long)]
    exit_on_end: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // --- Load Scenes ---
    let scenes = match &cli.scenes {
        Some(path) => load_scenes(path)?,
        None => default_scenes(),
    };
    info!(count = scenes.len(), "scene list loaded");

    let mut stage = Stage::new(&StageOptions {
        fps: cli.fps.max(1),
        record: cli.record.as_deref(),
    })?;
    let exit_on_end = cli.exit_on_end || stage.is_recording();

    // Declared after the stage so its textures are released while the window still exists.
    let mut presenter = Presenter::new(scenes);

    // --- Main Loop ---
    while !stage.should_close() {
        let now = stage.now();
        if stage.take_click() {
            presenter.click(now);
        }

        let outcome = presenter.frame(now, &mut stage);
        stage.present()?;

        if outcome == FrameOutcome::Ended && exit_on_end {
            break;
        }
    }

    presenter.teardown();
    stage.finish()?;
    Ok(())
}

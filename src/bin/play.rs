//! CLI tool for rendering a token script to audio
//!
//! Usage: play <song.txt> [-o output.wav] [-c config.yaml]
//!
//! If output is not specified, writes <song>.wav next to the script.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracksmith::wav::write_wav;
use tracksmith::{ComposerConfig, MusicComposer};

#[derive(Parser)]
#[clap(about = "Render a token script to a WAV file.")]
struct Args {
    /// Path to the token script.
    script: PathBuf,

    /// Output WAV file (defaults to the script path with a .wav extension).
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// YAML composer configuration.
    #[clap(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let output = args
        .output
        .unwrap_or_else(|| args.script.with_extension("wav"));

    let config = match &args.config {
        Some(path) => ComposerConfig::from_file(path)?,
        None => ComposerConfig::default(),
    };
    let sample_rate = config.sample_rate;

    let script = fs::read_to_string(&args.script)?;
    let mut composer = MusicComposer::new(config)?;
    let applied = composer.process_script(&script)?;

    let music = composer.music();
    info!(
        tokens = applied,
        tracks = composer.track_count(),
        samples = music.len(),
        seconds = music.len() as f32 / sample_rate as f32,
        "Composed music"
    );

    write_wav(&output, &music, sample_rate)?;
    info!(path = %output.display(), "Wrote WAV file");
    Ok(())
}

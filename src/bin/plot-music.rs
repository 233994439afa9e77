//! Plot the waveform of a token script as SVG
//!
//! Usage: plot-music <song.txt> [-o output.svg] [-c config.yaml] [--track N]

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use plotters::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracksmith::{AudioSignal, ComposerConfig, MusicComposer};

/// Upper bound on plotted points; longer signals are decimated
const MAX_POINTS: usize = 4000;

#[derive(Parser)]
#[clap(about = "Plot the waveform of a token script as SVG.")]
struct Args {
    /// Path to the token script.
    script: PathBuf,

    /// Output SVG file (defaults to the script path with a .svg extension).
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// YAML composer configuration.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Plot a single track instead of the mixed music.
    #[clap(long)]
    track: Option<usize>,
}

/// (seconds, min, max) per bucket, so peaks survive decimation
fn envelope_points(signal: &AudioSignal, sample_rate: u32) -> Vec<(f32, f32, f32)> {
    let bucket = signal.len().div_ceil(MAX_POINTS).max(1);
    signal
        .samples()
        .chunks(bucket)
        .enumerate()
        .map(|(i, chunk)| {
            let t = (i * bucket) as f32 / sample_rate as f32;
            let min = chunk.iter().copied().fold(f32::INFINITY, f32::min);
            let max = chunk.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            (t, min, max)
        })
        .collect()
}

fn create_plot(
    output: &Path,
    title: &str,
    signal: &AudioSignal,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(output, (1000, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let points = envelope_points(signal, sample_rate);
    let max_time = (signal.len() as f32 / sample_rate as f32).max(f32::EPSILON);
    let range = signal.peak().max(1.0) * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..max_time, -range..range)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Amplitude")
        .x_labels(10)
        .y_labels(10)
        .draw()?;

    chart.draw_series(LineSeries::new(
        points.iter().map(|&(t, _, max)| (t, max)),
        BLUE.stroke_width(1),
    ))?;
    chart.draw_series(LineSeries::new(
        points.iter().map(|&(t, min, _)| (t, min)),
        BLUE.stroke_width(1),
    ))?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let output = args
        .output
        .unwrap_or_else(|| args.script.with_extension("svg"));

    let config = match &args.config {
        Some(path) => ComposerConfig::from_file(path)?,
        None => ComposerConfig::default(),
    };
    let sample_rate = config.sample_rate;

    let script = fs::read_to_string(&args.script)?;
    let mut composer = MusicComposer::new(config)?;
    composer.process_script(&script)?;

    let (title, signal) = match args.track {
        Some(index) => {
            let track = composer.track(index).ok_or_else(|| {
                format!(
                    "track {} does not exist ({} tracks)",
                    index,
                    composer.track_count()
                )
            })?;
            (format!("Track {}", index), track.clone())
        }
        None => (
            format!("Music ({} tracks)", composer.track_count()),
            composer.music(),
        ),
    };

    create_plot(&output, &title, &signal, sample_rate)?;
    info!(path = %output.display(), samples = signal.len(), "Wrote plot");
    Ok(())
}

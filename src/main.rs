use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::info;

use wavescope::audio::{
    compute_descriptors, compute_envelope, AudioLoader, PlaybackController, RodioOutput, Source,
    DEFAULT_ENVELOPE_POINTS,
};
use wavescope::render::{WaveformRenderer, WaveformStyle};

#[derive(Parser)]
#[command(
    name = "wavescope",
    about = "Inspect, play, and visualize an audio file or URL"
)]
struct Args {
    /// Audio source: a file path or an http(s) URL
    source: String,

    /// Envelope resolution in points
    #[arg(long, default_value_t = DEFAULT_ENVELOPE_POINTS)]
    points: usize,

    /// Print descriptors as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Write the rendered waveform to a PPM image
    #[arg(long, value_name = "FILE")]
    render: Option<PathBuf>,

    /// Rendered surface width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Rendered surface height in pixels
    #[arg(long, default_value_t = 160)]
    height: u32,

    /// Play the audio while animating the playhead
    #[arg(long)]
    play: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let source = Source::parse(&args.source)?;
    let loader = AudioLoader::new();
    let buffer = loader.load(&source).await?;
    let duration = buffer.duration_seconds();

    let descriptors = compute_descriptors(&buffer);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
    } else {
        println!("duration:           {:.2}s", descriptors.duration_seconds);
        println!("channels:           {}", descriptors.channel_count);
        println!("sample rate:        {} Hz", descriptors.sample_rate);
        println!("rms:                {:.4}", descriptors.rms);
        println!("peak:               {:.4}", descriptors.peak);
        println!("crest factor:       {:.2}", descriptors.crest_factor);
        println!("zero-crossing rate: {:.4}", descriptors.zero_crossing_rate);
        println!("suggested preset:   {}", descriptors.suggested_preset);
    }

    let envelope = compute_envelope(&buffer, args.points);
    let style = WaveformStyle {
        responsive: false,
        ..WaveformStyle::default()
    };
    let mut renderer = WaveformRenderer::new(args.width, args.height, style);
    renderer.load(envelope, duration);

    if args.play {
        let mut controller = PlaybackController::new(RodioOutput::new()?);
        controller.set_buffer(buffer);
        controller.play()?;
        renderer.play(Instant::now());

        let mut last_report = Instant::now();
        while controller.is_playing() {
            renderer.tick(Instant::now());
            if last_report.elapsed() >= Duration::from_secs(1) {
                if let Some(spectrum) = controller.frequency_snapshot() {
                    let energy: u32 = spectrum.iter().map(|&b| u32::from(b)).sum();
                    let position = controller.position_seconds().unwrap_or(duration);
                    info!("t={position:.1}s spectral energy {energy}");
                }
                last_report = Instant::now();
            }
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
        renderer.pause();
        renderer.set_current_time(duration);
        info!("playback complete");
    }

    if let Some(path) = args.render {
        std::fs::write(&path, renderer.surface().to_ppm())?;
        info!("waveform written to {}", path.display());
    }

    Ok(())
}

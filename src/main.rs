mod capture;
mod color;
mod config;
mod controls;
mod keying;
mod mask;
mod matte;
mod output;

use anyhow::{bail, Context, Result};
use capture::{CaptureSource, ImageSequenceSource, RawStreamSource, StillImageSource};
use clap::Parser;
use color::ChannelOrder;
use config::{KeyingConfig, ParameterStore};
use keying::{KeyColor, ModelKind};
use mask::HsvRange;
use matte::{MatteEngine, SpillSuppression};
use output::{ImageFileOutput, OutputSink, RawStreamOutput};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Path meaning "standard input" / "standard output"
const STDIO: &str = "-";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input image, directory of frames, or "-" for a raw stream on stdin
    input: PathBuf,

    /// Output image path ("{n}" expands to the frame number), or "-" for a raw stream on stdout
    #[arg(short, long)]
    output: PathBuf,

    /// Frame size of raw streams, e.g. 1280x720
    #[arg(long, value_parser = parse_size)]
    raw: Option<(u32, u32)>,

    /// Channel order of raw input and output streams
    #[arg(long, value_enum, default_value_t = ChannelOrder::Rgb)]
    channel_order: ChannelOrder,

    /// Matte model
    #[arg(short, long, value_enum, default_value_t = ModelKind::Angular)]
    model: ModelKind,

    /// Key colour as normalized r,g,b (defaults depend on the model)
    #[arg(short, long)]
    key: Option<KeyColor>,

    /// Acceptance angle of the angular model, radians
    #[arg(long, default_value_t = 0.523599)]
    acceptance: f32,

    /// Cutoff angle of the angular model, radians
    #[arg(long, default_value_t = 0.18675)]
    cutoff: f32,

    /// Gain of the angular model, must be greater than zero
    #[arg(long, default_value_t = 1.0)]
    gain: f32,

    /// Screen balance of the saturation model, 0..=1
    #[arg(long, default_value_t = 0.5)]
    screen_balance: f32,

    /// Lower hue bound of the backdrop range (0-180)
    #[arg(long, default_value_t = 0)]
    low_h: u8,

    /// Upper hue bound of the backdrop range (0-180)
    #[arg(long, default_value_t = 180)]
    high_h: u8,

    #[arg(long, default_value_t = 0)]
    low_s: u8,

    #[arg(long, default_value_t = 255)]
    high_s: u8,

    #[arg(long, default_value_t = 0)]
    low_v: u8,

    #[arg(long, default_value_t = 255)]
    high_v: u8,

    /// Skip the key model for pixels outside the HSV backdrop range
    #[arg(long)]
    prefilter: bool,

    /// Disable dilate/erode cleanup of threshold masks
    #[arg(long)]
    no_morphology: bool,

    /// Boost red and blue on green-spill pixels after matting
    #[arg(long)]
    spill: bool,

    /// Write the matte (grayscale silhouette) instead of the keyed image
    #[arg(long)]
    show_matte: bool,

    /// Also write the matte as a one-channel mask to this path ("{n}" expands to the frame number)
    #[arg(long)]
    matte_output: Option<PathBuf>,

    /// Frames to produce from a still image (0 = until interrupted)
    #[arg(long, default_value_t = 1)]
    frames: u64,

    /// Target frames per second (0 = as fast as possible)
    #[arg(long, default_value_t = 0)]
    fps: u32,

    /// Read live adjustments ("gain 1.2", "low-h 40", ...) from stdin
    #[arg(long)]
    controls: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w
        .parse::<u32>()
        .map_err(|e| format!("invalid width '{w}': {e}"))?;
    let h = h
        .parse::<u32>()
        .map_err(|e| format!("invalid height '{h}': {e}"))?;
    Ok((w, h))
}

impl Args {
    fn keying_config(&self) -> KeyingConfig {
        let mut config = KeyingConfig::new(self.model);
        if let Some(key) = self.key {
            config.key = key;
        }
        config.params.acceptance_angle = self.acceptance;
        config.params.cutoff_angle = self.cutoff;
        config.params.gain = self.gain;
        config.params.screen_balance = self.screen_balance;

        config.hsv = HsvRange::new(
            [self.low_h, self.low_s, self.low_v],
            [self.high_h, self.high_s, self.high_v],
        );

        config.prefilter = self.prefilter;
        config.morphology = !self.no_morphology;
        config.spill = self.spill.then(SpillSuppression::default);
        config
    }

    fn is_stdio(path: &std::path::Path) -> bool {
        path.as_os_str() == STDIO
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("chromakey starting");

    let store = ParameterStore::new(args.keying_config()).context("Invalid keying configuration")?;

    let mut capture = open_capture(&args)?;
    let (width, height) = capture.resolution();
    tracing::info!("Input: {}x{}", width, height);

    let mut output: Box<dyn OutputSink> = if Args::is_stdio(&args.output) {
        Box::new(RawStreamOutput::new(std::io::stdout().lock(), args.channel_order))
    } else {
        Box::new(ImageFileOutput::new(&args.output).context("Failed to initialize output")?)
    };

    let mut matte_output = args
        .matte_output
        .as_ref()
        .map(ImageFileOutput::new)
        .transpose()
        .context("Failed to initialize matte output")?;

    if args.controls {
        if Args::is_stdio(&args.input) {
            bail!("--controls reads stdin, which is already the raw input stream");
        }
        tracing::info!("Reading adjustments from stdin");
        controls::spawn_stdin_controls(store.clone());
    }

    run_pipeline(
        capture.as_mut(),
        output.as_mut(),
        matte_output.as_mut(),
        &store,
        args.fps,
        args.show_matte,
    )?;

    tracing::info!("Wrote {} frames", output.frames_written());
    Ok(())
}

fn open_capture(args: &Args) -> Result<Box<dyn CaptureSource>> {
    if Args::is_stdio(&args.input) {
        let Some((width, height)) = args.raw else {
            bail!("reading frames from stdin needs --raw WIDTHxHEIGHT");
        };
        let source = RawStreamSource::new(std::io::stdin().lock(), width, height, args.channel_order)?;
        return Ok(Box::new(source));
    }

    if args.input.is_dir() {
        let source = ImageSequenceSource::open(&args.input)
            .context("Failed to open image sequence")?;
        Ok(Box::new(source))
    } else {
        let source = StillImageSource::open(&args.input, args.frames)
            .context("Failed to open input image")?;
        Ok(Box::new(source))
    }
}

fn run_pipeline<C, O>(
    capture: &mut C,
    output: &mut O,
    mut matte_output: Option<&mut ImageFileOutput>,
    store: &ParameterStore,
    target_fps: u32,
    show_matte: bool,
) -> Result<()>
where
    C: CaptureSource + ?Sized,
    O: OutputSink + ?Sized,
{
    let frame_duration = (target_fps > 0).then(|| Duration::from_secs_f32(1.0 / target_fps as f32));
    let mut frame_count = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_matte_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;
    let mut total_degenerate = 0usize;
    let mut total_coverage = 0.0f64;

    let mut snapshot = store.snapshot();
    let mut engine = MatteEngine::new(&snapshot.config).context("Failed to build matte engine")?;

    tracing::info!("Starting main pipeline loop");

    loop {
        let loop_start = Instant::now();

        // Parameters are fixed for the whole frame
        let latest = store.snapshot();
        if latest.version != snapshot.version {
            engine = MatteEngine::new(&latest.config).context("Failed to rebuild matte engine")?;
            snapshot = latest;
            tracing::info!("Applied configuration version {}", snapshot.version);
        }

        // Capture frame
        let capture_start = Instant::now();
        let Some(frame) = capture
            .capture_frame()
            .context("Failed to capture frame")?
        else {
            tracing::info!("Input exhausted after {} frames", frame_count);
            break;
        };
        total_capture_time += capture_start.elapsed();

        let matte_start = Instant::now();
        let result = engine.composite(&frame);
        total_matte_time += matte_start.elapsed();

        let output_start = Instant::now();
        let written = if show_matte {
            output.write_frame(&result.matte.to_rgb())
        } else {
            output.write_frame(&result.image)
        };
        written.context("Failed to write frame")?;

        if let Some(sink) = matte_output.as_deref_mut() {
            sink.write_mask(&result.matte.to_gray())
                .context("Failed to write matte")?;
        }
        total_output_time += output_start.elapsed();

        frame_count += 1;
        total_degenerate += result.degenerate_pixels;
        total_coverage += f64::from(result.matte.coverage());
        if result.spill_pixels > 0 {
            tracing::debug!(
                "Frame {}: spill suppression touched {} pixels",
                frame_count,
                result.spill_pixels
            );
        }

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_matte_ms = total_matte_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_capture_ms + avg_matte_ms + avg_output_ms;
            let actual_fps = 1000.0 / total_ms;

            let avg_kept = total_coverage * 100.0 / frame_count as f64;

            tracing::info!(
                "Frame {}: capture={:.1}ms, matte={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, kept={:.1}%",
                frame_count,
                avg_capture_ms,
                avg_matte_ms,
                avg_output_ms,
                total_ms,
                actual_fps,
                avg_kept
            );
        }

        // Frame rate limiting
        if let Some(frame_duration) = frame_duration {
            let elapsed = loop_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }

    if total_degenerate > 0 {
        tracing::warn!(
            "{} pixels across {} frames fell back to the default alpha",
            total_degenerate,
            frame_count
        );
    }

    Ok(())
}

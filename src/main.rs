use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use rep_sentinel::camera::Camera;
use rep_sentinel::{Config, ExerciseThresholds, FrameAnalysisPipeline, RepEvent};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExerciseArg {
    BicepCurl,
    Squat,
}

#[derive(Parser, Debug)]
#[command(name = "rep-sentinel")]
#[command(about = "Count exercise reps and flag form faults from recorded pose keypoints")]
struct Args {
    /// JSON-lines keypoint recording to replay
    #[arg(short, long)]
    recording: Option<String>,

    /// Frame rate used to time frames recorded without `timestamp_ms`
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// TOML config; overrides --exercise and --no-flip
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in thresholds to use without a config file
    #[arg(short, long, value_enum, default_value = "bicep-curl")]
    exercise: ExerciseArg,

    /// Keep annotations unmirrored (the default mirrors them as for a selfie camera)
    #[arg(long)]
    no_flip: bool,

    /// Write the effective config to this path and exit
    #[arg(long)]
    write_config: Option<String>,

    /// Print each frame's annotations as JSON
    #[arg(long)]
    annotations: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    if let Some(path) = &args.config {
        let config = Config::load(path)?;
        info!(path = %path, exercise = config.thresholds.exercise.name(), "config loaded");
        return Ok(config);
    }

    let mut config = Config::default();
    if let ExerciseArg::Squat = args.exercise {
        config.thresholds = ExerciseThresholds::squat();
    }
    if args.no_flip {
        config.flip_frame = false;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rep_sentinel=info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!(path = %path, "config written");
        return Ok(());
    }

    let Some(recording) = &args.recording else {
        anyhow::bail!("nothing to do: pass --recording or --write-config");
    };

    let mut camera = Camera::open(recording, args.fps)?;
    let mut pipeline = FrameAnalysisPipeline::from_config(&config)?;
    info!(exercise = config.thresholds.exercise.name(), recording = %recording, "replaying");

    let mut frame_no = 0usize;
    let frames = camera.replay(&mut pipeline, |output| {
        frame_no += 1;
        match output.event {
            Some(RepEvent::ResetCounters) => warn!(frame = frame_no, "counters reset"),
            Some(event) => info!(frame = frame_no, event = %event, "event"),
            None => {}
        }

        if args.annotations {
            println!("{}", serde_json::to_string(&output)?);
        }
        Ok(())
    })?;

    let counters = pipeline.counters();
    info!(frames, correct = counters.correct, incorrect = counters.incorrect, "replay finished");
    println!(
        "{} frames | CORRECT: {} | INCORRECT: {}",
        frames, counters.correct, counters.incorrect
    );

    Ok(())
}
